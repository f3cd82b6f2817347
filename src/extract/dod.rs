//! Date-of-death extractor (§4.2).

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::months::{month_to_num, MONTH_ALT};

/// Synonyms for "passed away", used ahead of an explicit date.
const DEATH_PHRASES: &[&str] = &[
    "passed away",
    "died",
    "went to be with the lord",
    "went home to be with the lord",
    "called home",
    "was called home",
    "transitioned",
    "entered into rest",
    "entered eternal rest",
    "departed this life",
    "went to be with jesus",
    "gained her wings",
    "gained his wings",
    "left this world",
    "went home to heaven",
];

const OBITUARY_CONTEXT_WORDS: &[&str] = &[
    "obituary",
    "death",
    "died",
    "passed",
    "memorial",
    "funeral",
    "visitation",
    "service",
    "survived by",
    "preceded in death",
    "loving memory",
];

static TEXTUAL_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_ALT})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{2,4}})\b"
    ))
    .unwrap()
});

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap());

static TEXTUAL_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_ALT})\.?\s+(\d{{1,2}}),?\s+(\d{{2,4}})\s*(?:-|–|—|to)\s*({MONTH_ALT})\.?\s+(\d{{1,2}}),?\s+(\d{{2,4}})\b"
    ))
    .unwrap()
});

static NUMERIC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\s*(?:-|–|—|to)\s*(\d{1,2})/(\d{1,2})/(\d{2,4})\b")
        .unwrap()
});

static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\s*(?:-|–|—)\s*(\d{4})\b").unwrap());

/// Expand a 2-digit year with pivot 50: `<=50 -> 20YY`, `>50 -> 19YY`.
fn expand_year(year: i32) -> i32 {
    if year >= 100 {
        year
    } else if year <= 50 {
        2000 + year
    } else {
        1900 + year
    }
}

fn make_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(expand_year(year), month, day)
}

fn is_acceptable(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today + Duration::days(1)
}

fn textual_date_at(caps: &regex::Captures, base: usize) -> Option<NaiveDate> {
    let month = month_to_num(&caps[base])?;
    let day: u32 = caps[base + 1].parse().ok()?;
    let year: i32 = caps[base + 2].parse().ok()?;
    make_date(year, month, day)
}

/// Scan `text` for a date of death, in the priority order from §4.2.
/// `today` bounds rejection of future dates.
pub fn extract_dod(text: &str, today: NaiveDate) -> Option<String> {
    let lower = text.to_lowercase();

    // 1. explicit death-phrase followed by a date.
    for phrase in DEATH_PHRASES {
        if let Some(pos) = lower.find(phrase) {
            let window_start = pos + phrase.len();
            let window_end = (window_start + 80).min(text.len());
            // `find` gives a byte offset into the lowercased copy, which
            // is guaranteed the same length/byte-layout as `text` for
            // ASCII phrase matches; slice the original to preserve case.
            if let Some(window) = text.get(window_start..window_end) {
                if let Some(caps) = TEXTUAL_DATE.captures(window) {
                    if let Some(date) = textual_date_at(&caps, 1) {
                        if is_acceptable(date, today) {
                            return Some(date.format("%Y-%m-%d").to_string());
                        }
                    }
                }
                if let Some(caps) = NUMERIC_DATE.captures(window) {
                    if let Some(date) = numeric_date_at(&caps, 1) {
                        if is_acceptable(date, today) {
                            return Some(date.format("%Y-%m-%d").to_string());
                        }
                    }
                }
            }
        }
    }

    // 2. birth-death textual range; second date wins.
    if let Some(caps) = TEXTUAL_RANGE.captures(text) {
        if let Some(date) = textual_date_at(&caps, 4) {
            if is_acceptable(date, today) {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    // 3. numeric range; second date wins.
    if let Some(caps) = NUMERIC_RANGE.captures(text) {
        if let Some(date) = numeric_date_at(&caps, 4) {
            if is_acceptable(date, today) {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    // 4. year-only range -> YYYY-01-01 of the second year.
    if let Some(caps) = YEAR_RANGE.captures(text) {
        if let Ok(year) = caps[2].parse::<i32>() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                if is_acceptable(date, today) {
                    return Some(date.format("%Y-%m-%d").to_string());
                }
            }
        }
    }

    // 5. obituary context + standalone date.
    let has_context = OBITUARY_CONTEXT_WORDS.iter().any(|w| lower.contains(w));
    if has_context {
        if let Some(caps) = TEXTUAL_DATE.captures(text) {
            if let Some(date) = textual_date_at(&caps, 1) {
                if is_acceptable(date, today) {
                    return Some(date.format("%Y-%m-%d").to_string());
                }
            }
        }
        if let Some(caps) = NUMERIC_DATE.captures(text) {
            if let Some(date) = numeric_date_at(&caps, 1) {
                if is_acceptable(date, today) {
                    return Some(date.format("%Y-%m-%d").to_string());
                }
            }
        }
    }

    // 6. last resort: any "Month D, 202X", last occurrence.
    let mut last: Option<NaiveDate> = None;
    for caps in TEXTUAL_DATE.captures_iter(text) {
        if let Some(date) = textual_date_at(&caps, 1) {
            if date.year() >= 2020 && date.year() < 2030 && is_acceptable(date, today) {
                last = Some(date);
            }
        }
    }
    last.map(|d| d.format("%Y-%m-%d").to_string())
}

fn numeric_date_at(caps: &regex::Captures, base: usize) -> Option<NaiveDate> {
    let month: u32 = caps[base].parse().ok()?;
    let day: u32 = caps[base + 1].parse().ok()?;
    let year: i32 = caps[base + 2].parse().ok()?;
    make_date(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 26).unwrap()
    }

    #[test]
    fn explicit_death_phrase_wins() {
        let text = "John Smith passed away on January 3, 2026 at his home.";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-01-03"));
    }

    #[test]
    fn synonym_phrase_is_recognized() {
        let text = "She went to be with the Lord on March 4, 2026.";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-03-04"));
    }

    #[test]
    fn birth_death_range_takes_second_date() {
        let text = "John Smith, January 2, 1950 - June 10, 2026, loving father.";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-06-10"));
    }

    #[test]
    fn numeric_range_takes_second_date() {
        let text = "01/02/1950 - 06/10/2026";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-06-10"));
    }

    #[test]
    fn year_only_range_returns_january_first() {
        let text = "1950 - 2026";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn obituary_context_accepts_standalone_date() {
        let text = "Obituary for Jane Doe. Service held June 1, 2026 at the chapel.";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2026-06-01"));
    }

    #[test]
    fn future_dates_are_rejected() {
        let text = "passed away on January 3, 2099";
        assert_eq!(extract_dod(text, today()), None);
    }

    #[test]
    fn two_digit_year_pivot() {
        // 25 -> 2025, 75 -> 1975
        let text = "died June 1, 25";
        assert_eq!(extract_dod(text, today()).as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn no_date_anywhere_returns_none() {
        assert_eq!(extract_dod("no dates here at all", today()), None);
    }
}
