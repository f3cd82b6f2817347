//! CRUD helpers over the schema in [`super`].
//!
//! Each multi-statement mutation runs inside its own transaction,
//! mirroring the index backend's `upsert_file`/`set_file_symbols`
//! pattern: one unit of work, committed or not, never half-applied.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Batch, Candidate, PersonQuery, ResultStatus, SearchNotification, UserNotification, UserQuery,
};

pub fn create_user_query(conn: &Connection, login_id: &str, query: &PersonQuery, search_key: &str) -> Result<UserQuery> {
    let query_json = serde_json::to_string(query)?;
    conn.execute(
        "INSERT INTO user_query (login_id, query_json, search_key) VALUES (?1, ?2, ?3)",
        params![login_id, query_json, search_key],
    )?;
    let id = conn.last_insert_rowid();
    get_user_query(conn, id)?.ok_or_else(|| anyhow::anyhow!("just-inserted user_query {id} missing"))
}

pub fn get_user_query(conn: &Connection, id: i64) -> Result<Option<UserQuery>> {
    conn.query_row(
        "SELECT id, login_id, query_json, search_key, disabled, confirmed, confirmed_at
         FROM user_query WHERE id = ?1",
        params![id],
        row_to_user_query,
    )
    .optional()
    .map_err(Into::into)
}

/// Non-disabled, non-confirmed saved searches — the batch sweep's
/// input set (§4.9).
pub fn list_active_user_queries(conn: &Connection) -> Result<Vec<UserQuery>> {
    let mut stmt = conn.prepare(
        "SELECT id, login_id, query_json, search_key, disabled, confirmed, confirmed_at
         FROM user_query WHERE disabled = 0 AND confirmed = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map([], row_to_user_query)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn update_search_key(conn: &Connection, id: i64, search_key: &str) -> Result<()> {
    conn.execute("UPDATE user_query SET search_key = ?2 WHERE id = ?1", params![id, search_key])?;
    Ok(())
}

/// §4.10 `confirm`: freeze the owning saved search. Irreversible from
/// within this store.
pub fn confirm_user_query(conn: &Connection, id: i64) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE user_query SET confirmed = 1, confirmed_at = ?2, disabled = 1 WHERE id = ?1",
        params![id, now],
    )?;
    Ok(())
}

fn row_to_user_query(row: &rusqlite::Row) -> rusqlite::Result<UserQuery> {
    let query_json: String = row.get(2)?;
    let query: PersonQuery = serde_json::from_str(&query_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into()))?;
    Ok(UserQuery {
        id: row.get(0)?,
        login_id: row.get(1)?,
        query,
        search_key: row.get(3)?,
        disabled: row.get::<_, i64>(4)? != 0,
        confirmed: row.get::<_, i64>(5)? != 0,
        confirmed_at: row.get(6)?,
    })
}

/// Fingerprints already on record for `user_query_id`, across all
/// prior batches — the "new result" pre-read (§3 invariant b, §4.9).
pub fn existing_fingerprints(conn: &Connection, user_query_id: i64) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT fingerprint FROM user_result WHERE user_query_id = ?1")?;
    let rows = stmt.query_map(params![user_query_id], |r| r.get::<_, String>(0))?;
    rows.collect::<rusqlite::Result<HashSet<String>>>().map_err(Into::into)
}

/// Insert one result row. Each insert is its own transaction (§5
/// "locking/transactions"); callers are expected to have already
/// checked `existing_fingerprints` to skip duplicates.
pub fn insert_result(
    conn: &Connection,
    user_query_id: i64,
    batch_id: Option<i64>,
    candidate: &Candidate,
) -> Result<i64> {
    let fingerprint = candidate.fingerprint();
    let candidate_json = serde_json::to_string(candidate)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO user_result (user_query_id, batch_id, fingerprint, candidate_json, status, is_read, ran_dt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_query_id,
            batch_id,
            fingerprint,
            candidate_json,
            candidate.status.as_str(),
            candidate.is_read,
            candidate.ran_dt,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

pub struct ResultRow {
    pub id: i64,
    pub user_query_id: i64,
    pub candidate: Candidate,
}

pub fn get_result(conn: &Connection, id: i64) -> Result<Option<ResultRow>> {
    conn.query_row(
        "SELECT id, user_query_id, candidate_json FROM user_result WHERE id = ?1",
        params![id],
        row_to_result,
    )
    .optional()
    .map_err(Into::into)
}

pub fn results_for_query(conn: &Connection, user_query_id: i64) -> Result<Vec<ResultRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_query_id, candidate_json FROM user_result WHERE user_query_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_query_id], row_to_result)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

fn row_to_result(row: &rusqlite::Row) -> rusqlite::Result<ResultRow> {
    let candidate_json: String = row.get(2)?;
    let candidate: Candidate = serde_json::from_str(&candidate_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into()))?;
    Ok(ResultRow { id: row.get(0)?, user_query_id: row.get(1)?, candidate })
}

fn save_candidate(conn: &Connection, id: i64, candidate: &Candidate) -> Result<()> {
    let candidate_json = serde_json::to_string(candidate)?;
    conn.execute(
        "UPDATE user_result SET candidate_json = ?2, status = ?3, is_read = ?4 WHERE id = ?1",
        params![id, candidate_json, candidate.status.as_str(), candidate.is_read],
    )?;
    Ok(())
}

/// §4.10 `markRead`: flip every pending, unread result under `user_query_id`.
pub fn mark_read(conn: &Connection, user_query_id: i64) -> Result<()> {
    for row in results_for_query(conn, user_query_id)? {
        if row.candidate.status == ResultStatus::Pending && !row.candidate.is_read {
            let mut candidate = row.candidate;
            candidate.is_read = true;
            save_candidate(conn, row.id, &candidate)?;
        }
    }
    Ok(())
}

pub fn set_result_status(conn: &Connection, id: i64, status: ResultStatus, is_read: bool) -> Result<Option<ResultRow>> {
    let Some(row) = get_result(conn, id)? else {
        return Ok(None);
    };
    let mut candidate = row.candidate;
    candidate.status = status;
    candidate.is_read = is_read;
    save_candidate(conn, id, &candidate)?;
    Ok(Some(ResultRow { id: row.id, user_query_id: row.user_query_id, candidate }))
}

/// §4.9 storage hygiene: null image URLs from any `ran_dt` older than
/// the most recent one for this query, so only the current snapshot
/// retains full image metadata.
pub fn null_stale_image_urls(conn: &Connection, user_query_id: i64) -> Result<()> {
    let rows = results_for_query(conn, user_query_id)?;
    let Some(latest) = rows.iter().map(|r| r.candidate.ran_dt.clone()).max() else {
        return Ok(());
    };
    for row in rows {
        if row.candidate.ran_dt != latest && row.candidate.image_url.is_some() {
            let mut candidate = row.candidate;
            candidate.image_url = None;
            save_candidate(conn, row.id, &candidate)?;
        }
    }
    Ok(())
}

pub fn create_batch(conn: &Connection, input_file: Option<&str>, created_at: &str) -> Result<Batch> {
    conn.execute(
        "INSERT INTO batches (input_file, created_at, total_queries, total_results) VALUES (?1, ?2, 0, 0)",
        params![input_file, created_at],
    )?;
    let id = conn.last_insert_rowid();
    get_batch(conn, id)?.ok_or_else(|| anyhow::anyhow!("just-inserted batch {id} missing"))
}

pub fn update_batch_totals(conn: &Connection, id: i64, total_queries: i64, total_results: i64) -> Result<()> {
    conn.execute(
        "UPDATE batches SET total_queries = ?2, total_results = ?3 WHERE id = ?1",
        params![id, total_queries, total_results],
    )?;
    Ok(())
}

pub fn get_batch(conn: &Connection, id: i64) -> Result<Option<Batch>> {
    conn.query_row(
        "SELECT id, input_file, created_at, total_queries, total_results FROM batches WHERE id = ?1",
        params![id],
        row_to_batch,
    )
    .optional()
    .map_err(Into::into)
}

pub fn latest_batch(conn: &Connection) -> Result<Option<Batch>> {
    conn.query_row(
        "SELECT id, input_file, created_at, total_queries, total_results FROM batches ORDER BY id DESC LIMIT 1",
        [],
        row_to_batch,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list_batches(conn: &Connection) -> Result<Vec<Batch>> {
    let mut stmt = conn.prepare(
        "SELECT id, input_file, created_at, total_queries, total_results FROM batches ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], row_to_batch)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

fn row_to_batch(row: &rusqlite::Row) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get(0)?,
        input_file: row.get(1)?,
        created_at: row.get(2)?,
        total_queries: row.get(3)?,
        total_results: row.get(4)?,
    })
}

/// §4.9 post-batch: users whose active, non-disabled searches now
/// have any unread pending results, summarized per user/search.
pub fn unread_pending_notifications(conn: &Connection) -> Result<Vec<UserNotification>> {
    let mut stmt = conn.prepare(
        "SELECT uq.login_id, ur.user_query_id, COUNT(*)
         FROM user_result ur
         JOIN user_query uq ON uq.id = ur.user_query_id
         WHERE ur.status = 'pending' AND ur.is_read = 0
           AND uq.disabled = 0 AND uq.confirmed = 0
         GROUP BY uq.login_id, ur.user_query_id
         ORDER BY uq.login_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
    })?;

    let mut by_user: HashMap<String, Vec<SearchNotification>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in rows {
        let (login_id, user_query_id, unread_count) = row?;
        if !by_user.contains_key(&login_id) {
            order.push(login_id.clone());
        }
        by_user
            .entry(login_id)
            .or_default()
            .push(SearchNotification { user_query_id, unread_count });
    }

    Ok(order
        .into_iter()
        .map(|login_id| {
            let searches = by_user.remove(&login_id).unwrap_or_default();
            UserNotification { login_id, searches }
        })
        .collect())
}

pub fn add_name_variant(conn: &Connection, name_a: &str, name_b: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO name_first_variant (name_a, name_b) VALUES (?1, ?2)",
        params![name_a.to_lowercase(), name_b.to_lowercase()],
    )?;
    Ok(())
}

pub fn list_name_variants(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT name_a, name_b FROM name_first_variant")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{CriteriaScores, ProviderKind};

    fn candidate(fingerprint_url: &str) -> Candidate {
        Candidate {
            id: "1".to_string(),
            name_full: Some("James Smith".to_string()),
            name_first: Some("James".to_string()),
            name_last: Some("Smith".to_string()),
            age: Some(71),
            dod: Some("2026-01-15".to_string()),
            city: Some("hamilton".to_string()),
            state: Some("OH".to_string()),
            source: "example.com".to_string(),
            url: fingerprint_url.to_string(),
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

    #[test]
    fn create_and_fetch_user_query_round_trips() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let created = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        let fetched = get_user_query(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.search_key, "abc123");
        assert!(!fetched.disabled);
    }

    #[test]
    fn confirm_disables_the_query() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let created = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        confirm_user_query(&conn, created.id).unwrap();
        let fetched = get_user_query(&conn, created.id).unwrap().unwrap();
        assert!(fetched.confirmed);
        assert!(fetched.disabled);
        assert!(fetched.confirmed_at.is_some());
    }

    #[test]
    fn insert_and_mark_read_round_trips() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let user_query = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        let candidate = candidate("https://example.com/obit");
        let result_id = insert_result(&conn, user_query.id, None, &candidate).unwrap();

        let before = get_result(&conn, result_id).unwrap().unwrap();
        assert!(!before.candidate.is_read);

        mark_read(&conn, user_query.id).unwrap();
        let after = get_result(&conn, result_id).unwrap().unwrap();
        assert!(after.candidate.is_read);
    }

    #[test]
    fn stale_image_urls_are_nulled_keeping_latest() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let user_query = create_user_query(&conn, "user-1", &query, "abc123").unwrap();

        let mut old = candidate("https://example.com/old");
        old.ran_dt = "2026-07-01T00:00:00Z".to_string();
        old.image_url = Some("https://example.com/old.jpg".to_string());
        let old_id = insert_result(&conn, user_query.id, None, &old).unwrap();

        let mut new = candidate("https://example.com/new");
        new.ran_dt = "2026-07-26T00:00:00Z".to_string();
        new.image_url = Some("https://example.com/new.jpg".to_string());
        let new_id = insert_result(&conn, user_query.id, None, &new).unwrap();

        null_stale_image_urls(&conn, user_query.id).unwrap();

        assert_eq!(get_result(&conn, old_id).unwrap().unwrap().candidate.image_url, None);
        assert!(get_result(&conn, new_id).unwrap().unwrap().candidate.image_url.is_some());
    }

    #[test]
    fn unread_pending_notifications_respects_disabled_queries() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let active = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        insert_result(&conn, active.id, None, &candidate("https://example.com/a")).unwrap();

        let confirmed = create_user_query(&conn, "user-1", &query, "def456").unwrap();
        confirm_user_query(&conn, confirmed.id).unwrap();
        insert_result(&conn, confirmed.id, None, &candidate("https://example.com/b")).unwrap();

        let notifications = unread_pending_notifications(&conn).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].searches.len(), 1);
        assert_eq!(notifications[0].searches[0].user_query_id, active.id);
    }
}
