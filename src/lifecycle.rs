//! Match lifecycle state machine (§4.10).

use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

use crate::db::queries as db;
use crate::exclusion::ExclusionStore;
use crate::models::{NewExclusion, ResultStatus};

/// `markRead(search)`: every pending, unread result under the search
/// becomes read. Used when the user opens the search's results view.
pub fn mark_read(conn: &Connection, user_query_id: i64) -> Result<()> {
    db::mark_read(conn, user_query_id)
}

/// `confirm(result)`: the result is confirmed and read; the owning
/// saved search is frozen. Irreversible from within this module.
pub fn confirm(conn: &Connection, result_id: i64) -> Result<()> {
    let row = db::set_result_status(conn, result_id, ResultStatus::Confirmed, true)?
        .ok_or_else(|| anyhow::anyhow!("result {result_id} not found"))?;
    db::confirm_user_query(conn, row.user_query_id)?;
    Ok(())
}

/// `reject(result, reason)`: the result is rejected and an exclusion
/// is inserted for its `(search_key, fingerprint, url, name)`,
/// per-query scoped. The exclusion insert is best-effort: if it
/// fails, the status change still commits and the failure is logged.
pub fn reject(conn: &Connection, result_id: i64, reason: Option<&str>) -> Result<()> {
    let row = db::set_result_status(conn, result_id, ResultStatus::Rejected, true)?
        .ok_or_else(|| anyhow::anyhow!("result {result_id} not found"))?;

    let user_query = db::get_user_query(conn, row.user_query_id)?
        .ok_or_else(|| anyhow::anyhow!("user_query {} not found", row.user_query_id))?;

    let store = ExclusionStore::new(conn);
    let input = NewExclusion {
        scope: None,
        search_key: Some(user_query.search_key),
        fingerprint: Some(row.candidate.fingerprint()),
        url: Some(row.candidate.url.clone()),
        name: row.candidate.name_full.clone(),
        reason: Some(reason.unwrap_or("wrong person").to_string()),
    };
    if let Err(err) = store.add(&input) {
        warn!(error = %err, result_id, "failed to record exclusion after reject; status change still committed");
    }
    Ok(())
}

/// `restore(result)`: the result returns to pending; the matching
/// exclusion (same search_key + fingerprint) is removed if found,
/// same best-effort semantic as `reject`.
pub fn restore(conn: &Connection, result_id: i64) -> Result<()> {
    let row = db::set_result_status(conn, result_id, ResultStatus::Pending, true)?
        .ok_or_else(|| anyhow::anyhow!("result {result_id} not found"))?;

    let user_query = db::get_user_query(conn, row.user_query_id)?
        .ok_or_else(|| anyhow::anyhow!("user_query {} not found", row.user_query_id))?;

    let store = ExclusionStore::new(conn);
    if let Err(err) = store.remove_matching(&user_query.search_key, &row.candidate.fingerprint()) {
        warn!(error = %err, result_id, "failed to remove exclusion on restore; status change still committed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, queries::create_user_query};
    use crate::models::{Candidate, CriteriaScores, PersonQuery, ProviderKind};

    fn candidate() -> Candidate {
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

    #[test]
    fn confirm_freezes_the_saved_search() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let user_query = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        let result_id = db::insert_result(&conn, user_query.id, None, &candidate()).unwrap();

        confirm(&conn, result_id).unwrap();

        let fetched = db::get_user_query(&conn, user_query.id).unwrap().unwrap();
        assert!(fetched.confirmed);
        assert!(fetched.disabled);
        let result = db::get_result(&conn, result_id).unwrap().unwrap();
        assert_eq!(result.candidate.status, ResultStatus::Confirmed);
    }

    #[test]
    fn reject_creates_exclusion_and_restore_removes_it() {
        let conn = open_in_memory().unwrap();
        let query = PersonQuery { last_name: "Smith".into(), first_name: Some("James".into()), ..Default::default() };
        let user_query = create_user_query(&conn, "user-1", &query, "abc123").unwrap();
        let result_id = db::insert_result(&conn, user_query.id, None, &candidate()).unwrap();

        reject(&conn, result_id, Some("not the right person")).unwrap();
        let store = ExclusionStore::new(&conn);
        let excluded = store.fingerprints_excluded("abc123").unwrap();
        assert!(excluded.contains(&candidate().fingerprint()));

        restore(&conn, result_id).unwrap();
        let excluded_after = store.fingerprints_excluded("abc123").unwrap();
        assert!(!excluded_after.contains(&candidate().fingerprint()));
        let result = db::get_result(&conn, result_id).unwrap().unwrap();
        assert_eq!(result.candidate.status, ResultStatus::Pending);
    }
}
