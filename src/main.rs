use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = obitwatch_engine::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
