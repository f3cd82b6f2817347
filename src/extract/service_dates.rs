//! Visitation/funeral service-date extractor (§4.2).

use once_cell::sync::Lazy;
use regex::Regex;

use super::months::{month_to_num, MONTH_ALT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDates {
    pub visitation: Option<String>,
    pub funeral: Option<String>,
}

static VISITATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)visitation.{{0,40}}?({MONTH_ALT})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s*(\d{{4}}))?"
    ))
    .unwrap()
});

static FUNERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:funeral|memorial)\s+service.{{0,40}}?({MONTH_ALT})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s*(\d{{4}}))?"
    ))
    .unwrap()
});

/// Infer the calendar year a bare "Month D" service date falls in,
/// relative to the date of death: the service starts in the DOD's
/// year, then advances to the next year iff the service's `(month,
/// day)` is strictly earlier than the DOD's `(month, day)` — the
/// general year-end-cusp rule, not just a December/January special case.
pub fn infer_year(month: u32, day: u32, dod_month: u32, dod_day: u32, dod_year: i32) -> i32 {
    if (month, day) < (dod_month, dod_day) {
        dod_year + 1
    } else {
        dod_year
    }
}

fn capture_date(caps: &regex::Captures, dod_month: u32, dod_day: u32, dod_year: i32) -> Option<String> {
    let month = month_to_num(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(explicit) => explicit.as_str().parse().ok()?,
        None => infer_year(month, day, dod_month, dod_day, dod_year),
    };
    chrono::NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Extract visitation/funeral service dates from free text, anchored
/// to the already-known date of death (`dod`, `YYYY-MM-DD`) for year
/// inference. Returns defaults (both `None`) if `dod` is absent or
/// malformed rather than failing the whole extraction.
pub fn extract_service_dates(text: &str, dod: Option<&str>) -> ServiceDates {
    let (dod_month, dod_day, dod_year) = match dod.and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        Some(date) => (
            chrono::Datelike::month(&date),
            chrono::Datelike::day(&date),
            chrono::Datelike::year(&date),
        ),
        None => return ServiceDates::default(),
    };

    let visitation = VISITATION_RE
        .captures(text)
        .and_then(|caps| capture_date(&caps, dod_month, dod_day, dod_year));
    let funeral = FUNERAL_RE
        .captures(text)
        .and_then(|caps| capture_date(&caps, dod_month, dod_day, dod_year));

    ServiceDates { visitation, funeral }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_dates_in_same_year() {
        let text = "Visitation will be held June 2nd. Funeral service June 3rd at the chapel.";
        let dates = extract_service_dates(text, Some("2026-06-01"));
        assert_eq!(dates.visitation.as_deref(), Some("2026-06-02"));
        assert_eq!(dates.funeral.as_deref(), Some("2026-06-03"));
    }

    #[test]
    fn infers_following_year_across_december_cusp() {
        let text = "Memorial service January 5th at the church.";
        let dates = extract_service_dates(text, Some("2025-12-28"));
        assert_eq!(dates.funeral.as_deref(), Some("2026-01-05"));
    }

    #[test]
    fn missing_dod_yields_defaults() {
        let text = "Visitation will be held June 2nd.";
        assert_eq!(extract_service_dates(text, None), ServiceDates::default());
    }

    #[test]
    fn no_service_language_yields_none() {
        let dates = extract_service_dates("Just a plain obituary with no services listed.", Some("2026-06-01"));
        assert_eq!(dates, ServiceDates::default());
    }

    #[test]
    fn advances_year_for_any_service_earlier_in_the_calendar_than_dod() {
        let text = "Memorial service February 10th at the church.";
        let dates = extract_service_dates(text, Some("2025-11-20"));
        assert_eq!(dates.funeral.as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn does_not_advance_when_service_falls_after_dod_in_the_calendar() {
        let text = "Memorial service December 1st at the church.";
        let dates = extract_service_dates(text, Some("2025-11-20"));
        assert_eq!(dates.funeral.as_deref(), Some("2025-12-01"));
    }

    #[test]
    fn explicit_year_overrides_inference() {
        let text = "Visitation will be held December 20, 2025 at the funeral home.";
        let dates = extract_service_dates(text, Some("2026-01-05"));
        assert_eq!(dates.visitation.as_deref(), Some("2025-12-20"));
    }
}
