use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::PersonQuery;

/// Top-level CLI entrypoint for the obituary search engine.
#[derive(Parser, Debug)]
#[command(
    name = "obitwatch",
    about = "Obituary search, scoring, and exclusion engine",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Print the result JSON schema version and exit.
    #[arg(long = "schema-version")]
    pub schema_version: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one saved-search sweep (§4.9).
    Batch(BatchArgs),
    /// Run one immediate search without persisting it.
    Search(SearchArgs),
    /// Record a new exclusion.
    Exclude(ExcludeArgs),
    /// List exclusions for a search key.
    Exclusions(ExclusionsArgs),
    /// Remove an exclusion by id.
    Unexclude(UnexcludeArgs),
    /// Print aggregate exclusion counters.
    ExclusionStats(ExclusionStatsArgs),
    /// List pending results awaiting review, from a batch or a file.
    Review(ReviewArgs),
    /// Run the long-lived HTTP+JSON daemon (§6 "HTTP surface (search service)").
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long = "addr", default_value = "127.0.0.1:7979")]
    pub addr: String,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long = "first")]
    pub first: Option<String>,

    #[arg(long = "last")]
    pub last: String,

    #[arg(long = "middle")]
    pub middle: Option<String>,

    #[arg(long = "nickname")]
    pub nickname: Option<String>,

    #[arg(long = "city")]
    pub city: Option<String>,

    #[arg(long = "state")]
    pub state: Option<String>,

    #[arg(long = "age")]
    pub age: Option<f64>,

    #[arg(long = "keywords")]
    pub keywords: Option<String>,

    /// Path to the SQLite database (read-only for this command; an
    /// immediate search never persists).
    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,

    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
}

impl SearchArgs {
    pub fn to_query(&self) -> anyhow::Result<PersonQuery> {
        if self.last.trim().is_empty() {
            anyhow::bail!("--last is required");
        }
        if self.first.is_none() && self.nickname.is_none() {
            anyhow::bail!("at least one of --first or --nickname is required");
        }
        Ok(PersonQuery {
            first_name: self.first.clone(),
            middle_name: self.middle.clone(),
            nickname: self.nickname.clone(),
            last_name: self.last.clone(),
            age: self.age,
            city: self.city.clone(),
            state: self.state.clone(),
            keywords: self.keywords.clone(),
            input_date: None,
        })
    }
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Optional JSON file of `{loginId, query}` entries to seed/refresh
    /// saved searches from before sweeping. When omitted, the sweep
    /// runs over whatever saved searches already exist in the database.
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct BatchSeedEntry {
    #[serde(rename = "loginId")]
    pub login_id: String,
    pub query: PersonQuery,
}

#[derive(Args, Debug)]
pub struct ExcludeArgs {
    #[arg(long = "search-key")]
    pub search_key: Option<String>,

    #[arg(long = "fingerprint")]
    pub fingerprint: Option<String>,

    #[arg(long = "url")]
    pub url: Option<String>,

    #[arg(long = "name")]
    pub name: Option<String>,

    #[arg(long = "reason")]
    pub reason: Option<String>,

    #[arg(long = "global")]
    pub global: bool,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExclusionsArgs {
    #[arg(long = "search-key")]
    pub search_key: String,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UnexcludeArgs {
    pub id: i64,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExclusionStatsArgs {
    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Review a JSON file of saved-search entries (same shape as
    /// `batch --file`) without touching the database.
    #[arg(long = "file", conflicts_with = "batch")]
    pub file: Option<PathBuf>,

    /// Review the pending results inserted by a prior batch id.
    #[arg(long = "batch", conflicts_with = "file")]
    pub batch: Option<i64>,

    #[arg(long = "database", env = "DATABASE_URL")]
    pub database: Option<PathBuf>,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
