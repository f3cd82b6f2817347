//! Exclusion store (§4.7): per-search and global suppression rules.

use std::collections::HashSet;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::fingerprint::has_unknown_dod;
use crate::models::{Exclusion, ExclusionScope, ExclusionStats, NewExclusion};

/// Lowercase the host, strip scheme and a trailing slash, for
/// exclusion/dedup URL comparisons (§3).
pub fn normalize_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default().to_lowercase();
            let mut path = parsed.path().to_string();
            if path.ends_with('/') && path.len() > 1 {
                path.pop();
            }
            format!("{host}{path}")
        }
        Err(_) => raw.trim_end_matches('/').to_lowercase(),
    }
}

pub struct ExclusionStore<'a> {
    conn: &'a Connection,
}

impl<'a> ExclusionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert an exclusion, idempotent on `(scope, search_key,
    /// fingerprint, normalized_url)`. Returns the row and whether it
    /// was newly created.
    pub fn add(&self, input: &NewExclusion) -> Result<(Exclusion, bool)> {
        let scope = input.scope.unwrap_or(ExclusionScope::PerQuery);
        if scope == ExclusionScope::PerQuery && input.search_key.is_none() {
            anyhow::bail!("per-query exclusions require a search_key");
        }
        if scope == ExclusionScope::Global && input.search_key.is_some() {
            anyhow::bail!("global exclusions must not carry a search_key");
        }
        if input.fingerprint.is_none() && input.url.is_none() {
            anyhow::bail!("at least one of fingerprint or url is required");
        }

        let normalized_url = input.url.as_deref().map(normalize_url);

        if let Some(existing) = self.find_matching(scope, input.search_key.as_deref(), input.fingerprint.as_deref(), normalized_url.as_deref())? {
            return Ok((existing, false));
        }

        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO exclusions (scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                scope.as_str(),
                input.search_key,
                input.fingerprint,
                normalized_url,
                input.name,
                input.reason,
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok((self.get(id)?.expect("just-inserted row must exist"), true))
    }

    fn find_matching(
        &self,
        scope: ExclusionScope,
        search_key: Option<&str>,
        fingerprint: Option<&str>,
        normalized_url: Option<&str>,
    ) -> Result<Option<Exclusion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at
             FROM exclusions
             WHERE scope = ?1
               AND (search_key IS ?2)
               AND (fingerprint_excluded IS ?3)
               AND (url_excluded IS ?4)",
        )?;
        let row = stmt
            .query_row(
                params![scope.as_str(), search_key, fingerprint, normalized_url],
                row_to_exclusion,
            )
            .optional()?;
        Ok(row)
    }

    pub fn get(&self, id: i64) -> Result<Option<Exclusion>> {
        self.conn
            .query_row(
                "SELECT id, scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at
                 FROM exclusions WHERE id = ?1",
                params![id],
                row_to_exclusion,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn remove(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM exclusions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Remove the exclusion matching `(search_key, fingerprint)`, if
    /// any (§4.10 `restore`). Best-effort: absence is not an error.
    pub fn remove_matching(&self, search_key: &str, fingerprint: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM exclusions WHERE search_key = ?1 AND fingerprint_excluded = ?2",
            params![search_key, fingerprint],
        )?;
        Ok(affected > 0)
    }

    /// Union of per-query exclusions for `search_key` and all global
    /// exclusions, filtered per §4.7: a fingerprint exclusion whose
    /// DOD component is `unknown` does not suppress on its own.
    pub fn fingerprints_excluded(&self, search_key: &str) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT fingerprint_excluded FROM exclusions
             WHERE fingerprint_excluded IS NOT NULL
               AND ((scope = 'per-query' AND search_key = ?1) OR scope = 'global')",
        )?;
        let rows = stmt.query_map(params![search_key], |row| row.get::<_, String>(0))?;
        let mut out = HashSet::new();
        for fp in rows {
            let fp = fp?;
            if !has_unknown_dod(&fp) {
                out.insert(fp);
            }
        }
        Ok(out)
    }

    pub fn urls_excluded(&self, search_key: &str) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url_excluded FROM exclusions
             WHERE url_excluded IS NOT NULL
               AND ((scope = 'per-query' AND search_key = ?1) OR scope = 'global')",
        )?;
        let rows = stmt.query_map(params![search_key], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<HashSet<String>>>().map_err(Into::into)
    }

    pub fn by_search_key(&self, search_key: &str) -> Result<Vec<Exclusion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at
             FROM exclusions WHERE search_key = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![search_key], row_to_exclusion)?;
        rows.collect::<rusqlite::Result<Vec<Exclusion>>>().map_err(Into::into)
    }

    pub fn global(&self) -> Result<Vec<Exclusion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at
             FROM exclusions WHERE scope = 'global' ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_exclusion)?;
        rows.collect::<rusqlite::Result<Vec<Exclusion>>>().map_err(Into::into)
    }

    pub fn all(&self) -> Result<Vec<Exclusion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope, search_key, fingerprint_excluded, url_excluded, name_excluded, reason, created_at
             FROM exclusions ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_exclusion)?;
        rows.collect::<rusqlite::Result<Vec<Exclusion>>>().map_err(Into::into)
    }

    pub fn stats(&self) -> Result<ExclusionStats> {
        let total: i64 = self.conn.query_row("SELECT COUNT(*) FROM exclusions", [], |r| r.get(0))?;
        let global: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exclusions WHERE scope = 'global'", [], |r| r.get(0))?;
        Ok(ExclusionStats { total, per_query: total - global, global })
    }

    /// Filter candidates against this search key per §4.7's load-bearing
    /// invariant: URL match alone always excludes; a fingerprint match
    /// excludes only when its DOD component is known.
    pub fn filter(&self, search_key: &str, candidates: Vec<crate::models::Candidate>) -> Result<Vec<crate::models::Candidate>> {
        let excluded_fingerprints = self.fingerprints_excluded(search_key)?;
        let excluded_urls = self.urls_excluded(search_key)?;
        Ok(candidates
            .into_iter()
            .filter(|c| {
                if excluded_urls.contains(&normalize_url(&c.url)) {
                    return false;
                }
                !excluded_fingerprints.contains(&c.fingerprint())
            })
            .collect())
    }
}

fn row_to_exclusion(row: &rusqlite::Row) -> rusqlite::Result<Exclusion> {
    let scope_raw: String = row.get(1)?;
    let scope = ExclusionScope::from_str(&scope_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into()))?;
    Ok(Exclusion {
        id: row.get(0)?,
        scope,
        search_key: row.get(2)?,
        fingerprint_excluded: row.get(3)?,
        url_excluded: row.get(4)?,
        name_excluded: row.get(5)?,
        reason: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn store(conn: &Connection) -> ExclusionStore<'_> {
        ExclusionStore::new(conn)
    }

    #[test]
    fn add_is_idempotent_on_the_dedup_tuple() {
        let conn = open_in_memory().unwrap();
        let store = store(&conn);
        let input = NewExclusion {
            scope: Some(ExclusionScope::PerQuery),
            search_key: Some("abc123".to_string()),
            fingerprint: Some("smith-j-hamilton-oh-2024-01-15".to_string()),
            ..Default::default()
        };
        let (first, first_new) = store.add(&input).unwrap();
        let (second, second_new) = store.add(&input).unwrap();
        assert!(first_new);
        assert!(!second_new);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn unknown_dod_fingerprint_alone_does_not_suppress() {
        let conn = open_in_memory().unwrap();
        let store = store(&conn);
        store
            .add(&NewExclusion {
                scope: Some(ExclusionScope::PerQuery),
                search_key: Some("abc123".to_string()),
                fingerprint: Some("fagan-m-unknown-ca-unknown".to_string()),
                ..Default::default()
            })
            .unwrap();
        let excluded = store.fingerprints_excluded("abc123").unwrap();
        assert!(excluded.is_empty());
    }

    #[test]
    fn known_dod_fingerprint_suppresses() {
        let conn = open_in_memory().unwrap();
        let store = store(&conn);
        store
            .add(&NewExclusion {
                scope: Some(ExclusionScope::PerQuery),
                search_key: Some("abc123".to_string()),
                fingerprint: Some("smith-j-hamilton-oh-2024-01-15".to_string()),
                ..Default::default()
            })
            .unwrap();
        let excluded = store.fingerprints_excluded("abc123").unwrap();
        assert!(excluded.contains("smith-j-hamilton-oh-2024-01-15"));
    }

    #[test]
    fn global_exclusion_applies_to_every_search_key() {
        let conn = open_in_memory().unwrap();
        let store = store(&conn);
        store
            .add(&NewExclusion {
                scope: Some(ExclusionScope::Global),
                fingerprint: Some("smith-j-hamilton-oh-2024-01-15".to_string()),
                ..Default::default()
            })
            .unwrap();
        let excluded = store.fingerprints_excluded("any-search-key").unwrap();
        assert!(excluded.contains("smith-j-hamilton-oh-2024-01-15"));
    }

    #[test]
    fn url_normalization_strips_scheme_and_trailing_slash() {
        assert_eq!(normalize_url("https://Example.com/obit/"), "example.com/obit");
        assert_eq!(normalize_url("http://example.com/obit"), "example.com/obit");
    }

    #[test]
    fn per_query_scope_requires_search_key() {
        let conn = open_in_memory().unwrap();
        let store = store(&conn);
        let result = store.add(&NewExclusion {
            scope: Some(ExclusionScope::PerQuery),
            fingerprint: Some("x".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
