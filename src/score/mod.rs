//! Scoring and ranking (§4.5).

use chrono::NaiveDate;

use crate::models::{Candidate, CriteriaScores, NormalizedQuery};
use crate::normalize::{adjusted_age, nickname_variants};

/// Score `last` against `query.last_norm`. Exact match is 100;
/// otherwise a Levenshtein similarity normalized to 0-100.
fn score_last_name(last: &str, query_last: &str) -> i64 {
    levenshtein_similarity(last, query_last)
}

/// Score `first` against `query.first_norm`. Exact → 100; a known
/// nickname pair → 85 (capped below 100 so a true first-name match
/// always outranks a nickname guess); otherwise Levenshtein similarity
/// if it clears 0.70, else 0.
fn score_first_name(first: &str, query_first: &str) -> i64 {
    if first == query_first {
        return 100;
    }
    if nickname_variants(query_first).contains(first) {
        return 85;
    }
    let ratio = levenshtein_ratio(first, query_first);
    if ratio >= 0.70 {
        (ratio * 90.0).round() as i64
    } else {
        0
    }
}

fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}

fn levenshtein_similarity(a: &str, b: &str) -> i64 {
    (levenshtein_ratio(a, b) * 100.0).round() as i64
}

fn score_state(state: &str, query_state: &str) -> i64 {
    if state.eq_ignore_ascii_case(query_state) {
        100
    } else {
        0
    }
}

fn score_city(city: &str, query_city: &str, state_matches: bool) -> i64 {
    if city == query_city {
        100
    } else if state_matches {
        50
    } else {
        0
    }
}

fn score_age(candidate_age: i64, query_age: i64, input_date: NaiveDate, as_of: NaiveDate) -> i64 {
    let adjusted = adjusted_age(query_age as f64, input_date, as_of);
    let delta = (candidate_age as f64 - adjusted).abs();
    if delta <= 0.5 {
        100
    } else if delta <= 1.0 {
        90
    } else if delta <= 2.0 {
        80
    } else if delta <= 3.0 {
        70
    } else if delta <= 4.0 {
        60
    } else if delta <= 5.0 {
        50
    } else if delta <= 6.0 {
        40
    } else {
        0
    }
}

fn score_keywords(keywords: &[String], title: &str, snippet: &str) -> Option<i64> {
    if keywords.is_empty() {
        return None;
    }
    let haystack = format!("{title} {snippet}").to_lowercase();
    let hit = keywords.iter().any(|kw| haystack.contains(kw));
    Some(if hit { 100 } else { 0 })
}

/// Score one candidate against the normalized query it was produced
/// for, as of `as_of` (used for age aging, §4.5/§9).
pub fn score_candidate(candidate: &Candidate, query: &NormalizedQuery, as_of: NaiveDate) -> CriteriaScores {
    let last_name = candidate
        .name_last
        .as_deref()
        .map(|last| score_last_name(&crate::normalize::normalize_name(last), &query.last_norm));

    let first_name = match (&candidate.name_first, &query.first_norm) {
        (Some(first), Some(query_first)) => {
            Some(score_first_name(&crate::normalize::normalize_name(first), query_first))
        }
        _ => None,
    };

    let state = match (&candidate.state, &query.state_norm) {
        (Some(state), Some(query_state)) => {
            Some(score_state(&crate::normalize::normalize_state(state), query_state))
        }
        _ => None,
    };

    let city = match (&candidate.city, &query.city_norm) {
        (Some(city), Some(query_city)) => {
            let norm_city = crate::normalize::normalize_city(city);
            let state_matches = state == Some(100);
            Some(score_city(&norm_city, query_city, state_matches))
        }
        _ => None,
    };

    let age = match (candidate.age, query.age) {
        (Some(candidate_age), Some(query_age)) => {
            Some(score_age(candidate_age, query_age, query.input_date, as_of))
        }
        _ => None,
    };

    let keywords = score_keywords(&query.keywords, &candidate.title, &candidate.snippet);

    CriteriaScores {
        last_name,
        first_name,
        state,
        city,
        age,
        keywords,
    }
}

/// Apply scoring to every candidate, dropping any whose first-name
/// criterion is exactly 0 (present and clearly different — §8
/// "no-same-name exclusion of strangers").
pub fn score_all(mut candidates: Vec<Candidate>, query: &NormalizedQuery, as_of: NaiveDate) -> Vec<Candidate> {
    candidates.retain_mut(|candidate| {
        let scores = score_candidate(candidate, query, as_of);
        if scores.first_name == Some(0) {
            return false;
        }
        candidate.score_final = scores.sum();
        candidate.score_max = 100 * scores.count();
        candidate.criteria_cnt = scores.count();
        candidate.scores = scores;
        true
    });
    candidates
}

const DEFAULT_RECENCY_WINDOW_DAYS: i64 = 14;
const DEFAULT_MAX_RESULTS: usize = 20;

fn is_recent(dod: &str, as_of: NaiveDate, window_days: i64) -> bool {
    match NaiveDate::parse_from_str(dod, "%Y-%m-%d") {
        Ok(date) => {
            if date > as_of {
                return false;
            }
            (as_of - date).num_days() <= window_days
        }
        Err(_) => false,
    }
}

/// Partition into recent (DOD present, within `window_days`, not
/// future) and other, sort each by score descending, concatenate
/// recent-first, assign ranks (ties share a rank; the first member of
/// the "other" partition always starts a fresh rank), and cap at
/// `max_results` (§4.5).
pub fn rank(
    candidates: Vec<Candidate>,
    as_of: NaiveDate,
    window_days: Option<i64>,
    max_results: Option<usize>,
) -> Vec<Candidate> {
    let window_days = window_days.unwrap_or(DEFAULT_RECENCY_WINDOW_DAYS);
    let max_results = max_results.unwrap_or(DEFAULT_MAX_RESULTS);

    let (mut recent, mut other): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(|c| c.dod.as_deref().is_some_and(|d| is_recent(d, as_of, window_days)));

    recent.sort_by(|a, b| b.score_final.cmp(&a.score_final));
    other.sort_by(|a, b| b.score_final.cmp(&a.score_final));

    let recent_len = recent.len();
    let mut ordered = recent;
    ordered.extend(other);

    let mut rank = 0i64;
    let mut prev_score: Option<i64> = None;
    for (idx, candidate) in ordered.iter_mut().enumerate() {
        let starts_other_partition = idx == recent_len && recent_len > 0;
        if prev_score != Some(candidate.score_final) || starts_other_partition {
            rank += 1;
        }
        candidate.rank = rank;
        prev_score = Some(candidate.score_final);
    }

    ordered.truncate(max_results);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonQuery, ProviderKind, ResultStatus};
    use crate::normalize::normalize_query;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 26).unwrap()
    }

    fn base_candidate() -> Candidate {
        Candidate {
            id: "1".to_string(),
            name_full: None,
            name_first: Some("James".to_string()),
            name_last: Some("Smith".to_string()),
            age: Some(71),
            dod: None,
            city: None,
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
            score_final: 0,
            score_max: 0,
            criteria_cnt: 0,
            rank: 0,
            is_read: false,
            status: ResultStatus::Pending,
            ran_dt: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn nickname_match_scores_per_scenario_1() {
        let query = PersonQuery {
            first_name: Some("Jim".into()),
            last_name: "Smith".into(),
            state: Some("OH".into()),
            age: Some(71.0),
            ..Default::default()
        };
        let normalized = normalize_query(&query, today()).unwrap();
        let candidate = base_candidate();
        let scores = score_candidate(&candidate, &normalized, today());
        assert_eq!(scores.last_name, Some(100));
        assert_eq!(scores.first_name, Some(85));
        assert_eq!(scores.state, Some(100));
        assert_eq!(scores.city, None);
        assert_eq!(scores.age, Some(100));
        assert_eq!(scores.sum(), 385);
        assert_eq!(scores.count() * 100, 400);
    }

    #[test]
    fn zero_first_name_score_drops_candidate() {
        let query = PersonQuery {
            first_name: Some("Robert".into()),
            last_name: "Smith".into(),
            ..Default::default()
        };
        let normalized = normalize_query(&query, today()).unwrap();
        let mut candidate = base_candidate();
        candidate.name_first = Some("Zoltan".to_string());
        let scored = score_all(vec![candidate], &normalized, today());
        assert!(scored.is_empty());
    }

    #[test]
    fn recent_dod_outranks_higher_score_scenario_5() {
        let mut a = base_candidate();
        a.id = "a".to_string();
        a.score_final = 380;
        a.dod = Some("2025-07-26".to_string());

        let mut b = base_candidate();
        b.id = "b".to_string();
        b.score_final = 340;
        b.dod = Some("2026-07-21".to_string());

        let ranked = rank(vec![a, b], today(), None, None);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].id, "a");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn ties_share_a_rank_and_other_partition_starts_fresh() {
        let mut a = base_candidate();
        a.id = "a".to_string();
        a.score_final = 300;
        a.dod = Some("2026-07-20".to_string());

        let mut b = base_candidate();
        b.id = "b".to_string();
        b.score_final = 300;
        b.dod = Some("2026-07-21".to_string());

        let mut c = base_candidate();
        c.id = "c".to_string();
        c.score_final = 300;
        c.dod = None;

        let ranked = rank(vec![a, b, c], today(), None, None);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 1);
        assert_eq!(ranked[2].rank, 2);
    }

    #[test]
    fn max_results_caps_output() {
        let candidates: Vec<Candidate> = (0..25)
            .map(|i| {
                let mut c = base_candidate();
                c.id = i.to_string();
                c.score_final = i;
                c
            })
            .collect();
        let ranked = rank(candidates, today(), None, Some(20));
        assert_eq!(ranked.len(), 20);
    }
}
