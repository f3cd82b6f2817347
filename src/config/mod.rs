//! Process-wide configuration (§6 environment variables, §10.3).
//!
//! Mirrors the CLI config layer's "defaults unless overridden"
//! approach, but the source here is environment variables rather than
//! a project TOML file — the search service is typically deployed
//! with its configuration injected by the process supervisor.

use std::env;
use std::time::Duration;

/// Search-provider credentials (§6).
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub serper_api_key: Option<String>,
    pub serpapi_key: Option<String>,
    pub google_cse_api_key: Option<String>,
    pub google_cse_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub search_provider: String,
    pub provider: ProviderConfig,
    pub enrich_pages: bool,
    pub enrich_top_n: usize,
    pub enrich_concurrency: usize,
    pub enrich_timeout: Duration,
    pub recency_window_days: i64,
    pub max_results: usize,
    pub domains_blocked: Vec<String>,
    pub database_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_provider: "serper".to_string(),
            provider: ProviderConfig::default(),
            enrich_pages: true,
            enrich_top_n: 1,
            enrich_concurrency: 3,
            enrich_timeout: Duration::from_secs(8),
            recency_window_days: 14,
            max_results: 20,
            domains_blocked: vec![".gov".to_string()],
            database_path: "obitwatch.db".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from environment, falling back to the defaults above for
    /// anything unset. Credentials left unset simply make the
    /// corresponding provider unavailable; the caller decides whether
    /// that's fatal (§7, fatal errors at startup).
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();

        if let Ok(provider) = env::var("SEARCH_PROVIDER") {
            config.search_provider = provider;
        }
        config.provider.serper_api_key = env::var("SERPER_API_KEY").ok();
        config.provider.serpapi_key = env::var("SERPAPI_KEY").ok();
        config.provider.google_cse_api_key = env::var("GOOGLE_CSE_API_KEY").ok();
        config.provider.google_cse_id = env::var("GOOGLE_CSE_ID").ok();

        if let Ok(flag) = env::var("ENRICH_PAGES") {
            config.enrich_pages = flag.to_lowercase() != "false";
        }

        if let Ok(database_url) = env::var("DATABASE_URL") {
            config.database_path = database_url;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_enrichment_and_serper() {
        let config = EngineConfig::default();
        assert!(config.enrich_pages);
        assert_eq!(config.search_provider, "serper");
        assert_eq!(config.domains_blocked, vec![".gov".to_string()]);
    }
}
