//! Decedent name extractor (§4.2).
//!
//! Search-result titles are noisy: funeral-home boilerplate, a glued-on
//! date with no separating space, " - Site Name" suffixes. This tries
//! the title first, falls back to snippet-specific patterns, and as a
//! last resort derives a name from the URL slug.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::states;

use super::months::MONTH_ALT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedName {
    pub name_full: String,
    pub name_first: String,
    pub name_last: String,
}

const BLOCKLIST: &[&str] = &[
    "obituary", "obituaries", "funeral", "home", "memorial", "service", "services",
    "death", "notice", "notices", "legacy", "care", "cremation", "chapel", "dignity",
    "videos", "website", "photos", "images", "soon", "recent",
];

const HONORIFICS: &[&str] = &["dr", "mr", "mrs", "ms", "miss", "rev", "prof"];

const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v", "esq", "md", "phd"];

/// Matches a capitalized word immediately followed, with no space, by
/// a month name — the "KellyFebruary 7, 2026" glue pattern.
static GLUED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)({MONTH_ALT})\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s*\d{{0,4}}")).unwrap()
});

/// A capital letter immediately preceding a month name with no space
/// between them, e.g. the `y` before `February` in `KellyFebruary`.
static GLUE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)([a-z])({MONTH_ALT})\b")).unwrap());

static NON_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z'\-\s]").unwrap());

/// Trailing `, City, ST` or `, City, StateName` — city limited to one
/// capitalized word so this can't devour a surname.
static TRAILING_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*[A-Z][A-Za-z']*\s*,\s*([A-Za-z][A-Za-z\s]*)\s*$").unwrap());

static LEADING_HONORIFIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^({})\.?\s+", HONORIFICS.join("|"))).unwrap()
});

/// `LASTNAME, Firstname [Middle...]` — all-caps last name, a comma,
/// then a capitalized first name.
static SNIPPET_LASTNAME_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2,}),\s+([A-Z][a-z]+)\b").unwrap());

/// `Firstname Lastname ... passed away`
static SNIPPET_PASSED_AWAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})\s+passed away\b").unwrap());

/// `Firstname Lastname, NN,` — name immediately followed by a bounded age.
static SNIPPET_COMMA_AGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3}),\s+\d{1,3},").unwrap());

/// Boilerplate lead-in phrases that precede a name in obituary prose.
static SNIPPET_LEADING_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(in\s+(?:loving\s+)?(?:memory|remembrance)\s+of|celebrating\s+the\s+life\s+of|in\s+memoriam\s+of)\s+").unwrap()
});

/// A trailing birth-death year range, e.g. `, 1950-2026.`
static TRAILING_YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",?\s*\d{4}\s*-\s*\d{4}\.?\s*$").unwrap());

fn insert_glue_boundary(text: &str) -> String {
    GLUE_BOUNDARY.replace_all(text, "$1 $2").into_owned()
}

fn strip_after_dash(text: &str) -> &str {
    match text.find(" - ") {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn strip_glued_date(text: &str) -> String {
    match GLUED_DATE.find(text) {
        Some(m) => text[..m.start()].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn strip_obituary_suffix(text: &str) -> &str {
    let lower = text.to_lowercase();
    if let Some(idx) = lower.find(" obituary") {
        &text[..idx]
    } else {
        text
    }
}

/// Strip a trailing `, City, ST`/`, City, StateName` only when the
/// final component actually resolves to a state.
fn strip_trailing_location(text: &str) -> String {
    if let Some(caps) = TRAILING_LOCATION.captures(text) {
        let state_part = caps.get(1).unwrap().as_str().trim();
        let is_state = states::is_valid_code(state_part) || states::full_name_to_code(state_part).is_some();
        if is_state {
            let whole = caps.get(0).unwrap();
            return text[..whole.start()].trim_end().to_string();
        }
    }
    text.to_string()
}

fn strip_leading_honorific(text: &str) -> String {
    LEADING_HONORIFIC.replace(text, "").into_owned()
}

fn strip_leading_phrase(text: &str) -> String {
    SNIPPET_LEADING_PHRASE.replace(text, "").into_owned()
}

fn strip_trailing_year_range(text: &str) -> String {
    TRAILING_YEAR_RANGE.replace(text, "").trim_end().to_string()
}

fn is_blocked(word: &str) -> bool {
    BLOCKLIST.contains(&word.to_lowercase().as_str())
}

fn is_suffix(word: &str) -> bool {
    let bare = word.trim_end_matches('.');
    SUFFIXES.contains(&bare.to_lowercase().as_str())
}

fn is_single_letter(word: &str) -> bool {
    word.chars().count() == 1
}

fn is_rejected_last_name(word: &str) -> bool {
    let lower = word.to_lowercase();
    let is_four_digit_year = word.len() == 4 && word.chars().all(|c| c.is_ascii_digit());
    let is_all_digits = !word.is_empty() && word.chars().all(|c| c.is_ascii_digit());
    is_four_digit_year || is_all_digits || BLOCKLIST.contains(&lower.as_str())
}

/// Pop trailing generational/professional suffixes (`Jr`, `Sr`,
/// `II`–`V`, `Esq`, `MD`, `PhD`) before picking first/last names.
fn pop_trailing_suffixes(mut words: Vec<&str>) -> Vec<&str> {
    while words.len() > 2 && is_suffix(words[words.len() - 1]) {
        words.pop();
    }
    words
}

fn candidate_from_tokens(tokens: &[&str]) -> Option<ExtractedName> {
    let words: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|w| !w.is_empty() && !is_blocked(w))
        .collect();
    if words.len() < 2 {
        return None;
    }
    let words = pop_trailing_suffixes(words);
    if words.len() < 2 {
        return None;
    }

    let name_first = words[0].to_string();
    let name_last = words
        .iter()
        .rev()
        .find(|w| !is_single_letter(w))
        .copied()
        .unwrap_or(words[words.len() - 1])
        .to_string();

    if name_first.eq_ignore_ascii_case(&name_last) {
        return None;
    }
    if is_rejected_last_name(&name_last) {
        return None;
    }

    let name_full = words.join(" ");
    Some(ExtractedName { name_full, name_first, name_last })
}

fn tokenize_capitalized(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false))
        .collect()
}

fn clean_candidate(raw: &str) -> Option<ExtractedName> {
    let glued = insert_glue_boundary(raw);
    let no_date = strip_glued_date(&glued);
    let no_dash = strip_after_dash(&no_date);
    let no_obit = strip_obituary_suffix(no_dash);
    let no_location = strip_trailing_location(no_obit);
    let no_honorific = strip_leading_honorific(&no_location);
    let stripped = NON_NAME_CHARS.replace_all(&no_honorific, " ");
    let tokens = tokenize_capitalized(&stripped);
    candidate_from_tokens(&tokens)
}

/// Snippet-only patterns that don't apply to titles: `LASTNAME,
/// Firstname`, `… passed away`, `…, NN,`.
fn clean_snippet(raw: &str) -> Option<ExtractedName> {
    if let Some(caps) = SNIPPET_LASTNAME_FIRST.captures(raw) {
        let last = caps.get(1).unwrap().as_str();
        let first = caps.get(2).unwrap().as_str();
        let last_title = title_case(last);
        if !is_rejected_last_name(&last_title) && !first.eq_ignore_ascii_case(&last_title) {
            return Some(ExtractedName {
                name_full: format!("{first} {last_title}"),
                name_first: first.to_string(),
                name_last: last_title,
            });
        }
    }

    if let Some(caps) = SNIPPET_PASSED_AWAY.captures(raw) {
        let span = caps.get(1).unwrap().as_str();
        if let Some(name) = candidate_from_tokens(&tokenize_capitalized(span)) {
            return Some(name);
        }
    }

    if let Some(caps) = SNIPPET_COMMA_AGE.captures(raw) {
        let span = caps.get(1).unwrap().as_str();
        if let Some(name) = candidate_from_tokens(&tokenize_capitalized(span)) {
            return Some(name);
        }
    }

    generic_snippet_fallback(raw)
}

/// Last resort for prose that doesn't fit one of the named patterns:
/// strip a known lead-in phrase and a trailing birth-death year range,
/// then tokenize what's left the same way the title pipeline does.
fn generic_snippet_fallback(raw: &str) -> Option<ExtractedName> {
    let no_phrase = strip_leading_phrase(raw);
    let glued = insert_glue_boundary(&no_phrase);
    let no_date = strip_glued_date(&glued);
    let no_year_range = strip_trailing_year_range(&no_date);
    let no_location = strip_trailing_location(&no_year_range);
    let stripped = NON_NAME_CHARS.replace_all(&no_location, " ");
    let tokens = tokenize_capitalized(&stripped);
    candidate_from_tokens(&tokens)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn from_url(url: &str) -> Option<ExtractedName> {
    let path = url.split('?').next().unwrap_or(url);
    let slug = path.trim_end_matches('/').rsplit('/').next()?;
    let slug = slug
        .trim_end_matches(".html")
        .trim_end_matches(".htm");
    let words: Vec<String> = slug
        .split(|c: char| c == '-' || c == '_')
        .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_alphabetic()))
        .map(|w| title_case(w))
        .collect();
    let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
    candidate_from_tokens(&refs)
}

/// Try the title, then snippet-specific patterns, then the URL slug;
/// the first candidate that survives validation wins.
pub fn extract_name(title: &str, snippet: &str, url: &str) -> Option<ExtractedName> {
    clean_candidate(title)
        .or_else(|| clean_snippet(snippet))
        .or_else(|| from_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_glued_date_with_no_separator() {
        let result = extract_name("Stephen KellyFebruary 7, 2026", "", "https://example.com/obit");
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "Stephen");
        assert_eq!(name.name_last, "Kelly");
    }

    #[test]
    fn handles_middle_name_and_site_suffix() {
        let result = extract_name(
            "Jesse Gerald May Obituary - Newcomer Dayton",
            "",
            "https://example.com/obit",
        );
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "Jesse");
        assert_eq!(name.name_last, "May");
        assert_eq!(name.name_full, "Jesse Gerald May");
    }

    #[test]
    fn falls_back_to_snippet_when_title_is_unusable() {
        let result = extract_name(
            "Obituary Notice",
            "In loving memory of Anna Weber, 1950-2026.",
            "https://example.com/obit",
        );
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "Anna");
        assert_eq!(name.name_last, "Weber");
    }

    #[test]
    fn falls_back_to_url_slug_as_last_resort() {
        let result = extract_name("...", "...", "https://example.com/obituaries/john-q-public.html");
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "John");
        assert_eq!(name.name_last, "Public");
    }

    #[test]
    fn single_word_title_yields_no_candidate() {
        assert_eq!(clean_candidate("Obituary"), None);
    }

    #[test]
    fn strips_leading_honorific() {
        let result = extract_name("Dr. John Smith", "", "https://example.com/obit");
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "John");
        assert_eq!(name.name_last, "Smith");
    }

    #[test]
    fn pops_trailing_generational_suffix() {
        let result = extract_name("Robert Downey Jr", "", "https://example.com/obit");
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "Robert");
        assert_eq!(name.name_last, "Downey");
    }

    #[test]
    fn strips_trailing_city_state() {
        let result = extract_name("John Smith, Hamilton, OH", "", "https://example.com/obit");
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "John");
        assert_eq!(name.name_last, "Smith");
    }

    #[test]
    fn snippet_lastname_comma_firstname_pattern() {
        let result = extract_name(
            "Obituary",
            "SMITH, James - passed peacefully at home.",
            "https://example.com/obit",
        );
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "James");
        assert_eq!(name.name_last, "Smith");
    }

    #[test]
    fn snippet_comma_age_pattern() {
        let result = extract_name(
            "Obituary",
            "Margaret Jane Fuller, 84, passed away peacefully Tuesday.",
            "https://example.com/obit",
        );
        let name = result.expect("expected a name");
        assert_eq!(name.name_first, "Margaret");
        assert_eq!(name.name_last, "Fuller");
    }
}
