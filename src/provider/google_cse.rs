//! Google Programmable Search (Custom Search Engine) adapter (§4.3).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{Candidate, NormalizedQuery, ProviderKind};

use super::{build_query_text, SearchProvider};

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

pub struct GoogleCseProvider {
    client: reqwest::Client,
    api_key: String,
    cx: String,
}

impl GoogleCseProvider {
    pub fn new(client: reqwest::Client, api_key: String, cx: String) -> Self {
        Self { client, api_key, cx }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleCseResponse {
    #[serde(default)]
    items: Vec<GoogleCseItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleCseItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for GoogleCseProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn search(&self, query: &NormalizedQuery) -> Vec<Candidate> {
        let url = match reqwest::Url::parse_with_params(
            ENDPOINT,
            &[
                ("q", build_query_text(query)),
                ("key", self.api_key.clone()),
                ("cx", self.cx.clone()),
            ],
        ) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "failed to build google cse request url");
                return Vec::new();
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "google cse request failed");
                return Vec::new();
            }
        };

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "google cse returned an error status");
                return Vec::new();
            }
        };

        let parsed: GoogleCseResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "failed to parse google cse response body");
                return Vec::new();
            }
        };

        parsed
            .items
            .into_iter()
            .map(|item| super::from_hit(&item.title, &item.link, &item.snippet, ProviderKind::Google))
            .collect()
    }
}
