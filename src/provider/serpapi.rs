//! SerpApi adapter (§4.3).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{Candidate, NormalizedQuery, ProviderKind};

use super::{build_query_text, SearchProvider};

const ENDPOINT: &str = "https://serpapi.com/search";

pub struct SerpApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default, rename = "organic_results")]
    organic_results: Vec<SerpApiItem>,
}

#[derive(Debug, Deserialize)]
struct SerpApiItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Serpapi
    }

    async fn search(&self, query: &NormalizedQuery) -> Vec<Candidate> {
        let url = match reqwest::Url::parse_with_params(
            ENDPOINT,
            &[
                ("q", build_query_text(query)),
                ("api_key", self.api_key.clone()),
                ("engine", "google".to_string()),
            ],
        ) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "failed to build serpapi request url");
                return Vec::new();
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "serpapi request failed");
                return Vec::new();
            }
        };

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "serpapi returned an error status");
                return Vec::new();
            }
        };

        let parsed: SerpApiResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "failed to parse serpapi response body");
                return Vec::new();
            }
        };

        parsed
            .organic_results
            .into_iter()
            .map(|item| super::from_hit(&item.title, &item.link, &item.snippet, ProviderKind::Serpapi))
            .collect()
    }
}
