//! Shared month-name recognition used by the date-of-death and
//! service-date extractors.

/// Alternation fragment (no capture group) matching any month name or
/// its common abbreviation, case-insensitively via the `(?i)` flag
/// applied by callers.
pub const MONTH_ALT: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec";

pub fn month_to_num(raw: &str) -> Option<u32> {
    let lower = raw.to_lowercase();
    let lower = lower.trim_end_matches('.');
    Some(match lower {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    })
}

/// True if `word` (case-insensitive, trailing punctuation stripped) is
/// a recognized month name or abbreviation.
pub fn is_month_word(word: &str) -> bool {
    let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
    month_to_num(trimmed).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_full_and_abbreviated_names() {
        assert_eq!(month_to_num("January"), Some(1));
        assert_eq!(month_to_num("Jan"), Some(1));
        assert_eq!(month_to_num("Jan."), Some(1));
        assert_eq!(month_to_num("sept"), Some(9));
        assert_eq!(month_to_num("bogus"), None);
    }
}
