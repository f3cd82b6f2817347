//! Runtime metrics (§9 "circular module dependency in the source").
//!
//! The source pulls its counters in via a lazy cross-module import
//! shared by the provider adapter and the enrichment module. Here
//! it's an independent component: constructed once per batch (or
//! once per immediate search) and passed down explicitly through the
//! pipeline, so nothing needs a global singleton to bump a counter.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::BatchMetrics;

#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    queries_run: AtomicI64,
    new_results_inserted: AtomicI64,
    provider_calls: AtomicI64,
    enrichment_fetches: AtomicI64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query_run(&self) {
        self.queries_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_new_results(&self, count: i64) {
        self.new_results_inserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enrichment_fetch(&self) {
        self.enrichment_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot into the persisted/reported shape, with `errors`
    /// supplied separately since those accumulate structured context
    /// (query id + message) rather than a bare counter.
    pub fn into_batch_metrics(self, errors: Vec<crate::models::BatchQueryError>) -> BatchMetrics {
        BatchMetrics {
            queries_run: self.queries_run.load(Ordering::Relaxed),
            new_results_inserted: self.new_results_inserted.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            enrichment_fetches: self.enrichment_fetches.load(Ordering::Relaxed),
            errors,
        }
    }
}
