//! Normalization & variants (§4.1).
//!
//! Canonicalizes names, cities, and states; expands nicknames; and
//! builds the deterministic search key for a `PersonQuery`.

mod nicknames;
pub(crate) mod states;

pub use nicknames::{augment_nickname_table, nickname_variants, NicknameTable};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::models::{NormalizedQuery, PersonQuery};

/// Lowercase, trim, collapse whitespace, strip punctuation except
/// internal hyphens, and normalize Unicode to NFC (diacritics kept).
pub fn normalize_name(raw: &str) -> String {
    let nfc: String = raw.nfc().collect();
    let lower = nfc.to_lowercase();

    let mut out = String::with_capacity(lower.len());
    let mut last_was_space = false;
    for ch in lower.chars() {
        if ch.is_alphanumeric() || ch == '-' {
            out.push(ch);
            last_was_space = false;
        } else if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
                last_was_space = true;
            }
        }
        // all other punctuation is dropped
    }
    out.trim().to_string()
}

/// Lowercase, strip punctuation, collapse whitespace, and unify
/// `St.`/`St `/`Saint ` prefixes to the canonical `saint `.
pub fn normalize_city(raw: &str) -> String {
    let base = normalize_name(raw);
    if let Some(rest) = base.strip_prefix("st ") {
        format!("saint {rest}")
    } else if let Some(rest) = base.strip_prefix("saint ") {
        format!("saint {rest}")
    } else {
        base
    }
}

/// Both `saint X` and `st X` spellings for matching against free text
/// that may use either form.
pub fn city_variants(normalized_city: &str) -> Vec<String> {
    if let Some(rest) = normalized_city.strip_prefix("saint ") {
        vec![format!("saint {rest}"), format!("st {rest}")]
    } else {
        vec![normalized_city.to_string()]
    }
}

/// Map a full U.S. state name (case-insensitive) to its 2-letter USPS
/// code; pass an already-2-letter code through uppercased; unknown
/// input passes through uppercased.
pub fn normalize_state(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(code) = states::full_name_to_code(trimmed) {
        return code.to_string();
    }
    trimmed.to_uppercase()
}

/// Split comma-separated keywords, lowercase, trim, drop empties.
pub fn normalize_keywords(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Age as of `input_date`, carried forward with fractional precision
/// to "today" (or another reference date), per §4.5 / §9.
pub fn adjusted_age(age: f64, input_date: NaiveDate, as_of: NaiveDate) -> f64 {
    let elapsed_days = (as_of - input_date).num_days() as f64;
    age + elapsed_days / 365.25
}

/// Parse `input_date` as a non-future ISO date; missing is "today".
/// A future date is rejected outright (§9 open question: the source
/// accepted arbitrary `inputDate`; we don't).
pub fn resolve_input_date(raw: Option<&str>, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match raw {
        None => Ok(today),
        Some(s) => {
            let parsed = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("invalid input_date: {s}"))?;
            if parsed > today {
                anyhow::bail!("input_date must not be in the future: {s}");
            }
            Ok(parsed)
        }
    }
}

/// Normalize a `PersonQuery` and compute its deterministic search key.
///
/// `search_key` = first 16 hex chars of SHA-256 over
/// `lastNorm|firstNorm|cityNorm|stateNorm|age`, lowercased and
/// pipe-joined (§3). Identical queries (mod casing) yield identical keys.
pub fn normalize_query(query: &PersonQuery, today: NaiveDate) -> anyhow::Result<NormalizedQuery> {
    if query.last_name.trim().is_empty() {
        anyhow::bail!("last name is required");
    }
    if query.first_name.as_deref().unwrap_or("").trim().is_empty()
        && query.nickname.as_deref().unwrap_or("").trim().is_empty()
    {
        anyhow::bail!("at least one of first name or nickname is required");
    }

    let last_norm = normalize_name(&query.last_name);
    let first_norm = query
        .first_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(normalize_name)
        .or_else(|| {
            query
                .nickname
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(normalize_name)
        });
    let middle_norm = query
        .middle_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(normalize_name);
    let city_norm = query
        .city
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(normalize_city);
    let state_norm = query
        .state
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_state(s));
    let age = query.age.map(|a| a.round() as i64);
    let keywords = normalize_keywords(query.keywords.as_deref());
    let input_date = resolve_input_date(query.input_date.as_deref(), today)?;

    let key_input = format!(
        "{}|{}|{}|{}|{}",
        last_norm,
        first_norm.as_deref().unwrap_or(""),
        city_norm.as_deref().unwrap_or(""),
        state_norm.as_deref().unwrap_or(""),
        age.map(|a| a.to_string()).unwrap_or_default(),
    )
    .to_lowercase();

    let search_key = search_key_hash(&key_input);

    Ok(NormalizedQuery {
        first_norm,
        middle_norm,
        last_norm,
        city_norm,
        state_norm,
        age,
        keywords,
        input_date,
        search_key,
    })
}

fn search_key_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Stable, process-local opaque id for a freshly parsed candidate
/// (§9 "ad-hoc per-candidate id"). Not cryptographically unique.
pub fn new_candidate_id(seed: &str, salt: u64) -> String {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    salt.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
