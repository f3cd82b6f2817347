//! Human-readable rendering of engine output for the CLI.

use anyhow::Result;

use crate::models::{Batch, BatchOutcome, Candidate, Exclusion, ExclusionStats, SearchOutcome};

/// Render a `SearchOutcome` as one line per candidate:
/// `rank. name (age) - city, state - score/max - url`.
pub fn print_search_text(outcome: &SearchOutcome) -> Result<()> {
    println!("searchKey: {}", outcome.search_key);
    if outcome.results.is_empty() {
        println!("(no candidates)");
        return Ok(());
    }
    for candidate in &outcome.results {
        println!("{}", format_candidate_line(candidate));
    }
    Ok(())
}

pub fn print_search_table(outcome: &SearchOutcome) -> Result<()> {
    println!("{:<4} {:<28} {:<6} {:<20} {:<6} {}", "rank", "name", "age", "location", "score", "url");
    for candidate in &outcome.results {
        let name = candidate.name_full.clone().unwrap_or_else(|| "unknown".to_string());
        let age = candidate.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
        let location = match (&candidate.city, &candidate.state) {
            (Some(city), Some(state)) => format!("{city}, {state}"),
            (Some(city), None) => city.clone(),
            (None, Some(state)) => state.clone(),
            (None, None) => "-".to_string(),
        };
        println!(
            "{:<4} {:<28} {:<6} {:<20} {:<6} {}",
            candidate.rank,
            name,
            age,
            location,
            format!("{}/{}", candidate.score_final, candidate.score_max),
            candidate.url,
        );
    }
    Ok(())
}

fn format_candidate_line(candidate: &Candidate) -> String {
    let name = candidate.name_full.clone().unwrap_or_else(|| "unknown".to_string());
    let age = candidate.age.map(|a| format!("{a}")).unwrap_or_else(|| "?".to_string());
    let location = match (&candidate.city, &candidate.state) {
        (Some(city), Some(state)) => format!("{city}, {state}"),
        (Some(city), None) => city.clone(),
        (None, Some(state)) => state.clone(),
        (None, None) => "unknown location".to_string(),
    };
    format!(
        "{}. {} ({}) - {} - {}/{} - {}",
        candidate.rank, name, age, location, candidate.score_final, candidate.score_max, candidate.url
    )
}

pub fn print_batch_text(outcome: &BatchOutcome) -> Result<()> {
    print_batch_summary(&outcome.batch);
    println!(
        "queries run: {}  new results: {}  provider calls: {}  enrichment fetches: {}  errors: {}",
        outcome.metrics.queries_run,
        outcome.metrics.new_results_inserted,
        outcome.metrics.provider_calls,
        outcome.metrics.enrichment_fetches,
        outcome.metrics.errors.len(),
    );
    for error in &outcome.metrics.errors {
        println!("  error: user_query {} - {}", error.user_query_id, error.message);
    }
    for notification in &outcome.notifications {
        let total: i64 = notification.searches.iter().map(|s| s.unread_count).sum();
        println!("  {} has {} new unread result(s)", notification.login_id, total);
    }
    Ok(())
}

pub fn print_batch_summary(batch: &Batch) {
    println!(
        "batch #{} ({}): {} queries, {} results",
        batch.id, batch.created_at, batch.total_queries, batch.total_results
    );
}

pub fn print_exclusion_text(exclusion: &Exclusion) -> Result<()> {
    println!(
        "#{} [{}] fp={} url={} name={} reason={}",
        exclusion.id,
        exclusion.scope.as_str(),
        exclusion.fingerprint_excluded.as_deref().unwrap_or("-"),
        exclusion.url_excluded.as_deref().unwrap_or("-"),
        exclusion.name_excluded.as_deref().unwrap_or("-"),
        exclusion.reason.as_deref().unwrap_or("-"),
    );
    Ok(())
}

pub fn print_exclusions_text(exclusions: &[Exclusion]) -> Result<()> {
    if exclusions.is_empty() {
        println!("(no exclusions)");
        return Ok(());
    }
    for exclusion in exclusions {
        print_exclusion_text(exclusion)?;
    }
    Ok(())
}

pub fn print_exclusion_stats_text(stats: &ExclusionStats) -> Result<()> {
    println!("total: {}  per-query: {}  global: {}", stats.total, stats.per_query, stats.global);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriteriaScores, ProviderKind, ResultStatus};

    fn candidate() -> Candidate {
        Candidate {
            id: "1".to_string(),
            name_full: Some("James Smith".to_string()),
            name_first: Some("James".to_string()),
            name_last: Some("Smith".to_string()),
            age: Some(71),
            dod: Some("2026-01-15".to_string()),
            city: Some("Hamilton".to_string()),
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
            score_final: 385,
            score_max: 400,
            criteria_cnt: 4,
            rank: 1,
            is_read: false,
            status: ResultStatus::Pending,
            ran_dt: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn candidate_line_includes_name_and_score() {
        let line = format_candidate_line(&candidate());
        assert!(line.contains("James Smith"));
        assert!(line.contains("385/400"));
    }
}
