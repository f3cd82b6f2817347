//! Search provider adapters (§4.3).
//!
//! The three adapters share one loose contract (§9 "provider
//! interchangeability"): given a normalized query, build a textual
//! search, call the provider, and parse hits into candidates via the
//! [`crate::extract`] pipeline. None of them ever return an error to
//! the caller — a failed call is logged and yields an empty result
//! set, so one flaky provider never aborts a query.

mod google_cse;
mod serpapi;
mod serper;

pub use google_cse::GoogleCseProvider;
pub use serpapi::SerpApiProvider;
pub use serper::SerperProvider;

use async_trait::async_trait;

use crate::extract;
use crate::models::{Candidate, NormalizedQuery, ProviderKind};
use crate::normalize;

/// Common contract for a third-party obituary search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Tag identifying which implementation produced a candidate.
    fn kind(&self) -> ProviderKind;

    /// Search for `query`, returning at most ~10 raw candidates.
    /// Never returns `Err` for upstream failures — those are logged
    /// and treated as zero results (§7, upstream-network errors).
    async fn search(&self, query: &NormalizedQuery) -> Vec<Candidate>;
}

/// Build the textual query string shared by all three adapters: first
/// name variants OR-ed together, plus last name, the literal word
/// `obituary`, plus city, plus state. Keywords are deliberately not
/// injected — they're scored post hoc (§4.5) instead.
pub fn build_query_text(query: &NormalizedQuery) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(first) = &query.first_norm {
        let variants = crate::normalize::nickname_variants(first);
        if variants.len() > 1 {
            let mut names: Vec<&str> = variants.iter().map(|s| s.as_str()).collect();
            names.sort_unstable();
            parts.push(format!("({})", names.join(" OR ")));
        } else {
            parts.push(first.clone());
        }
    }

    parts.push(query.last_norm.clone());
    parts.push("obituary".to_string());

    if let Some(city) = &query.city_norm {
        parts.push(city.clone());
    }
    if let Some(state) = &query.state_norm {
        parts.push(state.clone());
    }

    parts.join(" ")
}

/// Construct the configured provider from a `SEARCH_PROVIDER` tag and
/// its credentials (§6 environment variables). Returns `None` if the
/// tag is unrecognized or the needed credential is absent, in which
/// case callers should fail fast (§7, fatal errors at startup).
pub fn build_provider(
    provider: &str,
    client: reqwest::Client,
    config: &crate::config::ProviderConfig,
) -> Option<Box<dyn SearchProvider>> {
    match provider {
        "serper" => config
            .serper_api_key
            .clone()
            .map(|key| Box::new(SerperProvider::new(client, key)) as Box<dyn SearchProvider>),
        "serpapi" => config
            .serpapi_key
            .clone()
            .map(|key| Box::new(SerpApiProvider::new(client, key)) as Box<dyn SearchProvider>),
        "google" => match (&config.google_cse_api_key, &config.google_cse_id) {
            (Some(key), Some(cx)) => Some(Box::new(GoogleCseProvider::new(
                client,
                key.clone(),
                cx.clone(),
            )) as Box<dyn SearchProvider>),
            _ => None,
        },
        _ => None,
    }
}

/// Parse one raw search hit (title, URL, snippet) into a `Candidate`
/// via the §4.2 extractors, then compute its fingerprint. Used by all
/// three provider adapters so they share exactly one parsing path.
pub fn from_hit(title: &str, url: &str, snippet: &str, provider: ProviderKind) -> Candidate {
    let combined = format!("{title} {snippet}");
    let dod = extract::extract_dod(&combined, current_date());
    let service_dates = extract::extract_service_dates(&combined, dod.as_deref());
    let name = extract::extract_name(title, snippet, url);
    let location = extract::extract_location(&combined);
    let age = extract::extract_age(&combined);

    let id = normalize::new_candidate_id(url, 0);

    Candidate {
        id,
        name_full: name.as_ref().map(|n| n.name_full.clone()),
        name_first: name.as_ref().map(|n| n.name_first.clone()),
        name_last: name.as_ref().map(|n| n.name_last.clone()),
        age,
        dod,
        city: location.city,
        state: location.state,
        source: host_of(url),
        url: url.to_string(),
        snippet: snippet.to_string(),
        title: title.to_string(),
        provider,
        image_url: None,
        date_visitation: service_dates.visitation,
        date_funeral: service_dates.funeral,
        also_found_at: Vec::new(),
        scores: crate::models::CriteriaScores::default(),
        score_final: 0,
        score_max: 0,
        criteria_cnt: 0,
        rank: 0,
        is_read: false,
        status: crate::models::ResultStatus::Pending,
        ran_dt: chrono::Utc::now().to_rfc3339(),
    }
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// Dates of death found in search text can't legitimately be in the
/// future; bound rejection against today rather than accepting a
/// caller-supplied "as of" for provider parsing.
fn current_date() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonQuery;
    use crate::normalize::normalize_query;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 26).unwrap()
    }

    #[test]
    fn query_text_expands_nickname_variants() {
        let query = PersonQuery {
            first_name: Some("Jim".into()),
            last_name: "Smith".into(),
            city: Some("Hamilton".into()),
            state: Some("OH".into()),
            ..Default::default()
        };
        let normalized = normalize_query(&query, today()).unwrap();
        let text = build_query_text(&normalized);
        assert!(text.contains("james"));
        assert!(text.contains("jim"));
        assert!(text.contains("smith"));
        assert!(text.contains("obituary"));
    }

    #[test]
    fn query_text_omits_keywords() {
        let query = PersonQuery {
            first_name: Some("Anna".into()),
            last_name: "Weber".into(),
            keywords: Some("army, teacher".into()),
            ..Default::default()
        };
        let normalized = normalize_query(&query, today()).unwrap();
        let text = build_query_text(&normalized);
        assert!(!text.contains("army"));
        assert!(!text.contains("teacher"));
    }
}
