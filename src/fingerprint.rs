//! Content-addressed identity key used for dedup and exclusion matching (§4.4, §6).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize;

static DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").unwrap());

/// Build the fingerprint literal `last-firstInitial-city-state-dod`,
/// lowercased, hyphen-joined, with missing components rendered as the
/// literal `unknown` (§6).
///
/// Normalization always runs before assembly (§9 "fingerprint for city
/// variants" open question): callers pass raw-ish fields and this
/// function normalizes them itself, so a given identity always
/// produces the same fingerprint regardless of how its fields were
/// cased or punctuated upstream.
pub fn fingerprint(
    last: Option<&str>,
    first: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    dod: Option<&str>,
) -> String {
    let last_part = last
        .map(normalize::normalize_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let first_initial = first
        .map(normalize::normalize_name)
        .and_then(|s| s.chars().next().map(|c| c.to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let city_part = city
        .map(normalize::normalize_city)
        .filter(|s| !s.is_empty())
        .map(|s| s.replace(' ', "-"))
        .unwrap_or_else(|| "unknown".to_string());

    let state_part = state
        .map(normalize::normalize_state)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    let dod_part = dod
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "{last_part}-{first_initial}-{city_part}-{state_part}-{dod_part}",
        last_part = last_part,
        first_initial = first_initial,
        city_part = city_part,
        state_part = state_part,
        dod_part = dod_part
    )
}

/// True if the fingerprint's DOD component is the literal `unknown`,
/// used by the exclusion store's filter semantics (§4.7).
///
/// The DOD component is either the literal `unknown` or an ISO date
/// `YYYY-MM-DD`, so it can't be recovered by a naive last-`-`-split
/// (the date itself contains hyphens). Instead, check whether the
/// fingerprint ends in a date-shaped suffix.
pub fn has_unknown_dod(fp: &str) -> bool {
    !DATE_SUFFIX.is_match(fp)
}
