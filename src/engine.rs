//! Top-level pipeline orchestration (§2 "Data flow for one query").
//!
//! normalize → provider call → parse → dedup → domain-block filter →
//! exclusion filter → score → rank → enrich top-N → cap at
//! MaxResults. Persistence is the caller's job (the batch runner and
//! the HTTP `/search` handler differ on whether/how they persist).

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::warn;

use crate::config::EngineConfig;
use crate::dedup::dedup;
use crate::exclusion::ExclusionStore;
use crate::models::{Candidate, NormalizedQuery, PersonQuery, SearchOutcome, SEARCH_RESULT_VERSION};
use crate::normalize::normalize_query;
use crate::provider::SearchProvider;
use crate::{enrich, score};

/// Drop candidates whose URL host ends with a configured blocked
/// suffix (§4.8, default `.gov`). Invalid URLs pass through.
fn apply_domain_block(candidates: Vec<Candidate>, domains_blocked: &[String]) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| match url::Url::parse(&c.url) {
            Ok(parsed) => {
                let host = parsed.host_str().unwrap_or_default();
                !domains_blocked.iter().any(|suffix| host.ends_with(suffix.as_str()))
            }
            Err(_) => true,
        })
        .collect()
}

/// Run one query end to end against a single provider. `as_of` is the
/// reference date for age aging and recency ranking (normally "today";
/// threaded through explicitly so batch runs are reproducible).
pub async fn run_search(
    query: &PersonQuery,
    as_of: NaiveDate,
    provider: &dyn SearchProvider,
    conn: &Connection,
    http_client: reqwest::Client,
    config: &EngineConfig,
    metrics: &crate::metrics::RuntimeMetrics,
) -> anyhow::Result<SearchOutcome> {
    let normalized = normalize_query(query, as_of)?;
    let raw = run_search_normalized(&normalized, as_of, provider, conn, http_client, config, metrics).await?;
    Ok(SearchOutcome {
        version: SEARCH_RESULT_VERSION.to_string(),
        search_key: normalized.search_key,
        results: raw,
    })
}

async fn run_search_normalized(
    normalized: &NormalizedQuery,
    as_of: NaiveDate,
    provider: &dyn SearchProvider,
    conn: &Connection,
    http_client: reqwest::Client,
    config: &EngineConfig,
    metrics: &crate::metrics::RuntimeMetrics,
) -> anyhow::Result<Vec<Candidate>> {
    metrics.record_provider_call();
    let raw = provider.search(normalized).await;

    let deduped = dedup(raw);
    let domain_filtered = apply_domain_block(deduped, &config.domains_blocked);

    let store = ExclusionStore::new(conn);
    let fallback = domain_filtered.clone();
    let excluded = match store.filter(&normalized.search_key, domain_filtered) {
        Ok(filtered) => filtered,
        Err(err) => {
            warn!(error = %err, "exclusion filter lookup failed, proceeding without it");
            fallback
        }
    };

    let scored = score::score_all(excluded, normalized, as_of);
    let mut ranked = score::rank(
        scored,
        as_of,
        Some(config.recency_window_days),
        Some(config.max_results),
    );

    if config.enrich_pages {
        let enrich_config = enrich::EnrichConfig {
            top_n: config.enrich_top_n,
            concurrency: config.enrich_concurrency,
            timeout: config.enrich_timeout,
        };
        enrich::enrich(http_client, &mut ranked, enrich_config, metrics).await;
    }

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_block_drops_configured_suffix() {
        let candidates = vec![make_candidate("https://obits.ca.gov/smith")];
        let filtered = apply_domain_block(candidates, &[".gov".to_string()]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn domain_block_passes_invalid_urls_through() {
        let candidates = vec![make_candidate("not-a-url")];
        let filtered = apply_domain_block(candidates, &[".gov".to_string()]);
        assert_eq!(filtered.len(), 1);
    }

    fn make_candidate(url: &str) -> Candidate {
        use crate::models::{CriteriaScores, ProviderKind, ResultStatus};
        Candidate {
            id: "1".to_string(),
            name_full: None,
            name_first: None,
            name_last: None,
            age: None,
            dod: None,
            city: None,
            state: None,
            source: String::new(),
            url: url.to_string(),
            snippet: String::new(),
            title: String::new(),
            provider: ProviderKind::Serper,
            image_url: None,
            date_visitation: None,
            date_funeral: None,
            also_found_at: Vec::new(),
            scores: CriteriaScores::default(),
            score_final: 0,
            score_max: 0,
            criteria_cnt: 0,
            rank: 0,
            is_read: false,
            status: ResultStatus::Pending,
            ran_dt: "2026-07-26T00:00:00Z".to_string(),
        }
    }
}
