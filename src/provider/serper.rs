//! Serper.dev adapter (§4.3), the default/primary provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{Candidate, NormalizedQuery, ProviderKind};

use super::{build_query_text, SearchProvider};

const ENDPOINT: &str = "https://google.serper.dev/search";

pub struct SerperProvider {
    client: reqwest::Client,
    api_key: String,
}

impl SerperProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperItem>,
}

#[derive(Debug, Deserialize)]
struct SerperItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for SerperProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Serper
    }

    async fn search(&self, query: &NormalizedQuery) -> Vec<Candidate> {
        let body = serde_json::json!({ "q": build_query_text(query) });

        let response = match self
            .client
            .post(ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "serper request failed");
                return Vec::new();
            }
        };

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "serper returned an error status");
                return Vec::new();
            }
        };

        let parsed: SerperResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "failed to parse serper response body");
                return Vec::new();
            }
        };

        parsed
            .organic
            .into_iter()
            .map(|item| super::from_hit(&item.title, &item.link, &item.snippet, ProviderKind::Serper))
            .collect()
    }
}
