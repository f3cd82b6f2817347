use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use crate::config::EngineConfig;
use crate::models::SEARCH_RESULT_VERSION;

mod args;
mod config;
mod format;

pub use args::{
    BatchArgs, BatchSeedEntry, Cli, Commands, ExcludeArgs, ExclusionStatsArgs, ExclusionsArgs,
    OutputFormat, ReviewArgs, SearchArgs, ServeArgs, UnexcludeArgs,
};

use config::{
    apply_batch_config_defaults, apply_review_config_defaults, apply_search_config_defaults,
    load_cli_config,
};

/// Entry point for the CLI binary. Returns `Ok(())` on success; any
/// `Err` is printed by `main` and turned into exit code 1 (§7, "CLI
/// exit 1 on validation or fatal error").
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.schema_version {
        println!("Search result JSON schema version: {SEARCH_RESULT_VERSION}");
        return Ok(());
    }

    let cli_config = load_cli_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }
            runtime.block_on(run_search(search_args))
        }
        Some(Commands::Batch(mut batch_args)) => {
            if let Some(ref config) = cli_config {
                apply_batch_config_defaults(config, &mut batch_args);
            }
            runtime.block_on(run_batch(batch_args))
        }
        Some(Commands::Exclude(exclude_args)) => run_exclude(exclude_args),
        Some(Commands::Exclusions(exclusions_args)) => run_exclusions(exclusions_args),
        Some(Commands::Unexclude(unexclude_args)) => run_unexclude(unexclude_args),
        Some(Commands::ExclusionStats(stats_args)) => run_exclusion_stats(stats_args),
        Some(Commands::Review(mut review_args)) => {
            if let Some(ref config) = cli_config {
                apply_review_config_defaults(config, &mut review_args);
            }
            run_review(review_args)
        }
        Some(Commands::Serve(serve_args)) => runtime.block_on(run_serve(serve_args)),
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn database_path(explicit: &Option<PathBuf>, config: &EngineConfig) -> PathBuf {
    explicit.clone().unwrap_or_else(|| PathBuf::from(&config.database_path))
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let query = args.to_query()?;
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let provider = crate::provider::build_provider(&config.search_provider, reqwest::Client::new(), &config.provider)
        .ok_or_else(|| anyhow::anyhow!("no provider configured for {} (missing credentials?)", config.search_provider))?;

    let metrics = crate::metrics::RuntimeMetrics::new();
    let today = chrono::Utc::now().date_naive();
    let outcome = crate::engine::run_search(&query, today, provider.as_ref(), &conn, reqwest::Client::new(), &config, &metrics).await?;

    match args.format.unwrap_or(OutputFormat::Text) {
        OutputFormat::Text => format::print_search_text(&outcome),
        OutputFormat::Table => format::print_search_table(&outcome),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), &outcome)?;
            println!();
            Ok(())
        }
    }
}

async fn run_batch(args: BatchArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    if let Some(file) = &args.file {
        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read seed file at {}", file.display()))?;
        let entries: Vec<BatchSeedEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse seed file at {}", file.display()))?;
        for entry in entries {
            let search_key = crate::normalize::normalize_query(&entry.query, chrono::Utc::now().date_naive())?.search_key;
            crate::db::queries::create_user_query(&conn, &entry.login_id, &entry.query, &search_key)?;
        }
    }

    let provider = crate::provider::build_provider(&config.search_provider, reqwest::Client::new(), &config.provider)
        .ok_or_else(|| anyhow::anyhow!("no provider configured for {} (missing credentials?)", config.search_provider))?;

    let today = chrono::Utc::now().date_naive();
    let input_file = args.file.as_ref().map(|p| p.display().to_string());
    let outcome = crate::batch::run_batch(&conn, today, provider.as_ref(), reqwest::Client::new(), &config, input_file.as_deref()).await?;

    format::print_batch_text(&outcome)
}

fn run_exclude(args: ExcludeArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let scope = if args.global { crate::models::ExclusionScope::Global } else { crate::models::ExclusionScope::PerQuery };
    let input = crate::models::NewExclusion {
        scope: Some(scope),
        search_key: args.search_key,
        fingerprint: args.fingerprint,
        url: args.url,
        name: args.name,
        reason: args.reason,
    };

    let store = crate::exclusion::ExclusionStore::new(&conn);
    let (exclusion, _created) = store.add(&input)?;
    format::print_exclusion_text(&exclusion)
}

fn run_exclusions(args: ExclusionsArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let store = crate::exclusion::ExclusionStore::new(&conn);
    let exclusions = store.by_search_key(&args.search_key)?;
    format::print_exclusions_text(&exclusions)
}

fn run_unexclude(args: UnexcludeArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let store = crate::exclusion::ExclusionStore::new(&conn);
    if !store.remove(args.id)? {
        anyhow::bail!("exclusion {} not found", args.id);
    }
    println!("removed exclusion {}", args.id);
    Ok(())
}

fn run_exclusion_stats(args: ExclusionStatsArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let store = crate::exclusion::ExclusionStore::new(&conn);
    let stats = store.stats()?;
    format::print_exclusion_stats_text(&stats)
}

fn run_review(args: ReviewArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let rows = match (&args.file, args.batch) {
        (Some(file), None) => {
            let contents = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read review file at {}", file.display()))?;
            let entries: Vec<BatchSeedEntry> = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse review file at {}", file.display()))?;
            let mut rows = Vec::new();
            for entry in entries {
                let search_key = crate::normalize::normalize_query(&entry.query, chrono::Utc::now().date_naive())?.search_key;
                if let Some(user_query) = crate::db::queries::list_active_user_queries(&conn)?
                    .into_iter()
                    .find(|q| q.search_key == search_key)
                {
                    rows.extend(crate::db::queries::results_for_query(&conn, user_query.id)?);
                }
            }
            rows
        }
        (None, Some(batch_id)) => {
            crate::db::queries::list_active_user_queries(&conn)?
                .into_iter()
                .flat_map(|q| crate::db::queries::results_for_query(&conn, q.id).unwrap_or_default())
                .filter(|row| row.candidate.status == crate::models::ResultStatus::Pending)
                .filter(|row| {
                    // ran_dt is the batch's created_at; scope review to
                    // the requested batch's timestamp.
                    crate::db::queries::get_batch(&conn, batch_id)
                        .ok()
                        .flatten()
                        .map(|batch| batch.created_at == row.candidate.ran_dt)
                        .unwrap_or(false)
                })
                .collect()
        }
        _ => anyhow::bail!("review requires exactly one of --file or --batch"),
    };

    if rows.is_empty() {
        println!("(nothing pending review)");
        return Ok(());
    }

    for row in rows {
        match args.format {
            OutputFormat::Json => {
                serde_json::to_writer(std::io::stdout(), &row.candidate)?;
                println!();
            }
            OutputFormat::Text | OutputFormat::Table => {
                println!("#{}: {}", row.id, format_review_line(&row.candidate));
            }
        }
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = EngineConfig::from_env();
    let db_path = database_path(&args.database, &config);
    let conn = crate::db::open(&db_path)?;

    let addr: std::net::SocketAddr = args.addr.parse().context("invalid --addr")?;
    println!("Starting obituary search engine HTTP server on http://{addr}");

    let state = crate::server::AppState {
        conn: std::sync::Arc::new(tokio::sync::Mutex::new(conn)),
        config: std::sync::Arc::new(config),
        http_client: reqwest::Client::new(),
    };

    crate::server::run(addr, state).await
}

fn format_review_line(candidate: &crate::models::Candidate) -> String {
    let name = candidate.name_full.clone().unwrap_or_else(|| "unknown".to_string());
    format!("{} - {}/{} - {}", name, candidate.score_final, candidate.score_max, candidate.url)
}
