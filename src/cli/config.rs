//! Project-level CLI defaults (`.obitwatch/config.toml`), applied
//! underneath explicit flags the way the engine applies environment
//! defaults underneath everything else.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{BatchArgs, OutputFormat, ReviewArgs, SearchArgs};

/// Top-level representation of `.obitwatch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub search: Option<SearchSection>,
    #[serde(default)]
    pub batch: Option<BatchSection>,
    #[serde(default)]
    pub review: Option<ReviewSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchSection {
    #[serde(default)]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewSection {
    #[serde(default)]
    pub database: Option<PathBuf>,
}

pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let Some(path) = find_project_config(&cwd) else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_dir = current.join(".obitwatch");
        let config_toml = config_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let obitwatch_toml = config_dir.join("obitwatch.toml");
        if obitwatch_toml.is_file() {
            return Some(obitwatch_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    if let Some(search) = &config.search {
        if args.database.is_none() {
            args.database = search.database.clone();
        }
        if args.format.is_none() {
            args.format = search.format;
        }
    }
}

pub fn apply_batch_config_defaults(config: &CliConfig, args: &mut BatchArgs) {
    if let Some(batch) = &config.batch {
        if args.database.is_none() {
            args.database = batch.database.clone();
        }
    }
}

pub fn apply_review_config_defaults(config: &CliConfig, args: &mut ReviewArgs) {
    if let Some(review) = &config.review {
        if args.database.is_none() {
            args.database = review.database.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let toml = r#"
            [search]
            format = "json"
        "#;
        let config: CliConfig = toml::from_str(toml).unwrap();
        assert!(matches!(config.search.unwrap().format, Some(OutputFormat::Json)));
        assert!(config.batch.is_none());
    }
}
