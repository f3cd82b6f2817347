//! Page enrichment (§4.6): concurrent fetch of top-ranked candidates'
//! pages to back-fill DOD, service dates, and an image URL.

mod html;
mod image;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::extract;
use crate::models::Candidate;

const DEFAULT_TOP_N: usize = 1;
const DEFAULT_CONCURRENCY: usize = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone, Copy)]
pub struct EnrichConfig {
    pub top_n: usize,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn needs_enrichment(candidate: &Candidate) -> bool {
    !candidate.url.is_empty()
        && (candidate.date_funeral.is_none()
            || candidate.date_visitation.is_none()
            || candidate.image_url.is_none()
            || candidate.dod.is_none())
}

/// Enrich the top `config.top_n` ranked candidates whose page is
/// fetchable and missing some field, bounded by a worker pool of size
/// `config.concurrency`. Mutates candidates in place, additively only
/// (§8 "enrichment is purely additive"). Any per-page failure is
/// logged and treated as "no enrichment" — it never fails the search.
pub async fn enrich(client: reqwest::Client, candidates: &mut [Candidate], config: EnrichConfig, metrics: &crate::metrics::RuntimeMetrics) {
    let targets: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| needs_enrichment(c))
        .take(config.top_n)
        .map(|(idx, _)| idx)
        .collect();

    if targets.is_empty() {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut handles = Vec::with_capacity(targets.len());

    for idx in &targets {
        let url = candidates[*idx].url.clone();
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let timeout = config.timeout;
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            fetch_enrichment(&client, &url, timeout).await
        }));
    }

    for (idx, handle) in targets.into_iter().zip(handles) {
        metrics.record_enrichment_fetch();
        match handle.await {
            Ok(Some(page)) => apply_enrichment(&mut candidates[idx], page),
            Ok(None) => debug!(url = %candidates[idx].url, "enrichment yielded no page data"),
            Err(err) => debug!(error = %err, "enrichment task panicked"),
        }
    }
}

struct EnrichedPage {
    text: String,
    html: String,
}

async fn fetch_enrichment(client: &reqwest::Client, url: &str, timeout: Duration) -> Option<EnrichedPage> {
    let fut = async {
        let response = client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            debug!(status = %response.status(), url, "enrichment fetch returned non-success status");
            return None;
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("html") {
            debug!(content_type, url, "enrichment fetch rejected non-html content type");
            return None;
        }
        let body = response.text().await.ok()?;
        let text = html::html_to_text(&body);
        Some(EnrichedPage { text, html: body })
    };

    match tokio::time::timeout(timeout, fut).await {
        Ok(page) => page,
        Err(_) => {
            debug!(url, "enrichment fetch timed out");
            None
        }
    }
}

fn apply_enrichment(candidate: &mut Candidate, page: EnrichedPage) {
    if candidate.dod.is_none() {
        candidate.dod = extract::extract_dod(&page.text, chrono::Utc::now().date_naive());
    }

    let service_dates = extract::extract_service_dates(&page.text, candidate.dod.as_deref());
    if candidate.date_visitation.is_none() {
        candidate.date_visitation = service_dates.visitation;
    }
    if candidate.date_funeral.is_none() {
        candidate.date_funeral = service_dates.funeral;
    }

    if candidate.image_url.is_none() {
        candidate.image_url = image::extract_image(&page.html, &candidate.url);
    }

    // death precedes its services: if DOD is still missing, fall back
    // to whichever service date we have, funeral first.
    if candidate.dod.is_none() {
        candidate.dod = candidate
            .date_funeral
            .clone()
            .or_else(|| candidate.date_visitation.clone());
    }
}
