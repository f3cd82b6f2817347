//! Age extractor (§4.2).

use once_cell::sync::Lazy;
use regex::Regex;

const MIN_AGE: i64 = 0;
const MAX_AGE: i64 = 119;

static AGE_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bage\s+(?:of\s+)?(\d{1,3})\b").unwrap());
static AGED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\baged?\s+(\d{1,3})\b").unwrap());
static PARENS_AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{1,3})\)").unwrap());

fn in_range(n: i64) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&n)
}

/// Extract a plausible age (0-119) from free text, trying the three
/// common obituary phrasings in order: "age of NN", "aged NN" / "age
/// NN", and a bare "(NN)" trailing a name.
pub fn extract_age(text: &str) -> Option<i64> {
    for re in [&*AGE_OF, &*AGED, &*PARENS_AGE] {
        if let Some(caps) = re.captures(text) {
            if let Ok(n) = caps[1].parse::<i64>() {
                if in_range(n) {
                    return Some(n);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_age_of_phrasing() {
        assert_eq!(extract_age("passed away at the age of 87."), Some(87));
    }

    #[test]
    fn extracts_aged_phrasing() {
        assert_eq!(extract_age("John Smith, aged 72, passed away."), Some(72));
    }

    #[test]
    fn extracts_bare_age_phrasing() {
        assert_eq!(extract_age("John Smith, age 72, of Dayton."), Some(72));
    }

    #[test]
    fn extracts_parenthetical_age() {
        assert_eq!(extract_age("John Smith (72) of Dayton passed away."), Some(72));
    }

    #[test]
    fn rejects_implausible_ages() {
        assert_eq!(extract_age("born in the year 1999 in room 150"), None);
    }

    #[test]
    fn no_age_present() {
        assert_eq!(extract_age("no age mentioned here"), None);
    }
}
