//! City/state extractor (§4.2).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::states::{full_name_to_code, is_valid_code};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
}

/// `City, ST` or `City, State Name` — the dominant obituary-site convention.
static CITY_STATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-zA-Z.'\s]{1,30}?),\s*([A-Z]{2}|[A-Z][a-z]+(?:\s[A-Z][a-z]+)*)\b").unwrap());

fn resolve_state(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_valid_code(trimmed) {
        return Some(trimmed.to_uppercase());
    }
    full_name_to_code(trimmed).map(|s| s.to_string())
}

/// Scan `text` for a `City, State` pair. Accepts either a USPS code or
/// a full state name on the right-hand side; rejects candidates whose
/// right-hand side isn't a recognized state (avoids matching things
/// like "Smith, Jr").
pub fn extract_location(text: &str) -> Location {
    for caps in CITY_STATE.captures_iter(text) {
        let city_raw = caps[1].trim();
        let state_raw = &caps[2];
        if let Some(state) = resolve_state(state_raw) {
            if city_raw.split_whitespace().count() <= 4 && !city_raw.is_empty() {
                return Location {
                    city: Some(city_raw.to_string()),
                    state: Some(state),
                };
            }
        }
    }
    Location::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_city_and_usps_code() {
        let loc = extract_location("She lived in Hamilton, OH for most of her life.");
        assert_eq!(loc.city.as_deref(), Some("Hamilton"));
        assert_eq!(loc.state.as_deref(), Some("OH"));
    }

    #[test]
    fn extracts_city_and_full_state_name() {
        let loc = extract_location("Resident of Dayton, Ohio since 1990.");
        assert_eq!(loc.city.as_deref(), Some("Dayton"));
        assert_eq!(loc.state.as_deref(), Some("OH"));
    }

    #[test]
    fn rejects_non_state_suffix() {
        let loc = extract_location("Survived by his son, Jr. and daughter.");
        assert_eq!(loc, Location::default());
    }

    #[test]
    fn no_match_yields_defaults() {
        assert_eq!(extract_location("No location mentioned here."), Location::default());
    }
}
