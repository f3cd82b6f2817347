//! Daily sweep over saved searches (§4.9).
//!
//! Serial across queries by default (§5 "Batch sweep"); one query's
//! provider/DB failure is recorded in the per-batch error list and
//! never aborts the rest.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::warn;

use crate::config::EngineConfig;
use crate::db::queries as db;
use crate::metrics::RuntimeMetrics;
use crate::models::{BatchOutcome, BatchQueryError};
use crate::provider::SearchProvider;

/// Run one sweep over every non-disabled, non-confirmed saved search.
/// `input_file` is recorded on the batch row for traceability, not
/// read by this function (the caller already loaded whatever queries
/// it decided to sweep via `list_active_user_queries`).
pub async fn run_batch(
    conn: &Connection,
    as_of: NaiveDate,
    provider: &dyn SearchProvider,
    http_client: reqwest::Client,
    config: &EngineConfig,
    input_file: Option<&str>,
) -> anyhow::Result<BatchOutcome> {
    let created_at = chrono::Utc::now().to_rfc3339();
    let batch = db::create_batch(conn, input_file, &created_at)?;

    let metrics = RuntimeMetrics::new();
    let mut errors: Vec<BatchQueryError> = Vec::new();
    let mut total_results: i64 = 0;

    let active = db::list_active_user_queries(conn)?;
    let total_queries = active.len() as i64;

    for user_query in &active {
        metrics.record_query_run();

        let outcome = crate::engine::run_search(
            &user_query.query,
            as_of,
            provider,
            conn,
            http_client.clone(),
            config,
            &metrics,
        )
        .await;

        let ranked = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, user_query_id = user_query.id, "batch query failed, continuing sweep");
                errors.push(BatchQueryError { user_query_id: user_query.id, message: err.to_string() });
                continue;
            }
        };

        if ranked.search_key != user_query.search_key {
            db::update_search_key(conn, user_query.id, &ranked.search_key)?;
        }

        let seen = db::existing_fingerprints(conn, user_query.id)?;
        let mut inserted = 0i64;
        for candidate in &ranked.results {
            let fingerprint = candidate.fingerprint();
            if seen.contains(&fingerprint) {
                continue;
            }
            if let Err(err) = db::insert_result(conn, user_query.id, Some(batch.id), candidate) {
                warn!(error = %err, user_query_id = user_query.id, "failed to insert new result");
                errors.push(BatchQueryError { user_query_id: user_query.id, message: err.to_string() });
                continue;
            }
            inserted += 1;
        }
        metrics.record_new_results(inserted);
        total_results += inserted;

        if let Err(err) = db::null_stale_image_urls(conn, user_query.id) {
            warn!(error = %err, user_query_id = user_query.id, "failed to null stale image urls");
        }
    }

    db::update_batch_totals(conn, batch.id, total_queries, total_results)?;
    let batch = db::get_batch(conn, batch.id)?.ok_or_else(|| anyhow::anyhow!("batch {} vanished after update", batch.id))?;

    let notifications = db::unread_pending_notifications(conn)?;
    let batch_metrics = metrics.into_batch_metrics(errors);

    Ok(BatchOutcome { batch, metrics: batch_metrics, notifications })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{Candidate, NormalizedQuery, PersonQuery, ProviderKind};
    use async_trait::async_trait;

    struct StubProvider {
        candidates: Vec<Candidate>,
    }

    #[async_trait]
    impl SearchProvider for StubProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Serper
        }

        async fn search(&self, _query: &NormalizedQuery) -> Vec<Candidate> {
            self.candidates.clone()
        }
    }

    fn candidate() -> Candidate {
        use crate::models::{CriteriaScores, ResultStatus};
        Candidate {
            id: "1".to_string(),
            name_full: Some("James Smith".to_string()),
            name_first: Some("James".to_string()),
            name_last: Some("Smith".to_string()),
            age: Some(71),
            dod: Some("2026-01-15".to_string()),
            city: Some("hamilton".to_string()),
            state: Some("oh".to_string()),
            source: "example.com".to_string(),
            url: "https://example.com/obit".to_string(),
            snippet: String::new(),
            title: String::new(),
            provider: ProviderKind::Serper,
            image_url: None,
            date_visitation: None,
            date_funeral: None,
            also_found_at: Vec::new(),
            scores: CriteriaScores::default(),
            score_final: 385,
            score_max: 400,
            criteria_cnt: 4,
            rank: 1,
            is_read: false,
            status: ResultStatus::Pending,
            ran_dt: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn sweep_inserts_new_results_and_notifies() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let search_key = crate::normalize::normalize_query(&query, chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap())
            .unwrap()
            .search_key;
        db::create_user_query(&conn, "user-1", &query, &search_key).unwrap();

        let provider = StubProvider { candidates: vec![candidate()] };
        let as_of = chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let config = EngineConfig { enrich_pages: false, ..EngineConfig::default() };

        let outcome = run_batch(&conn, as_of, &provider, reqwest::Client::new(), &config, None).await.unwrap();

        assert_eq!(outcome.batch.total_queries, 1);
        assert_eq!(outcome.batch.total_results, 1);
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].searches[0].unread_count, 1);
    }

    #[tokio::test]
    async fn sweep_skips_duplicate_fingerprints_on_rerun() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let search_key = crate::normalize::normalize_query(&query, chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap())
            .unwrap()
            .search_key;
        db::create_user_query(&conn, "user-1", &query, &search_key).unwrap();

        let provider = StubProvider { candidates: vec![candidate()] };
        let as_of = chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let config = EngineConfig { enrich_pages: false, ..EngineConfig::default() };

        run_batch(&conn, as_of, &provider, reqwest::Client::new(), &config, None).await.unwrap();
        let second = run_batch(&conn, as_of, &provider, reqwest::Client::new(), &config, None).await.unwrap();

        assert_eq!(second.batch.total_results, 0);
    }
}
