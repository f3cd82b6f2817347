//! Cross-provider merge of candidates that refer to the same person (§4.4).

use std::collections::HashMap;

use crate::models::{Candidate, ProviderKind};

/// Merge candidates sharing a fingerprint. Within each group the
/// highest-provisional-score candidate wins (provisional = any score
/// already assigned to `score_final`, zero if scoring hasn't run yet);
/// the losers' URLs are recorded in the winner's `also_found_at`. If a
/// losing candidate is from a `Native` provider, its non-null
/// structured fields (name parts, age, DOD) are borrowed into the
/// winner whenever the winner is missing them — native sources are
/// funeral-home pages, generally more reliable than a bare search hit.
pub fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut groups: HashMap<String, Vec<Candidate>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for candidate in candidates {
        let fingerprint = candidate.fingerprint();
        if !groups.contains_key(&fingerprint) {
            order.push(fingerprint.clone());
        }
        groups.entry(fingerprint).or_default().push(candidate);
    }

    order
        .into_iter()
        .filter_map(|fingerprint| groups.remove(&fingerprint))
        .map(merge_group)
        .collect()
}

fn merge_group(mut members: Vec<Candidate>) -> Candidate {
    members.sort_by(|a, b| b.score_final.cmp(&a.score_final));
    let mut winner = members.remove(0);

    for loser in members {
        if loser.url != winner.url && !winner.also_found_at.contains(&loser.url) {
            winner.also_found_at.push(loser.url.clone());
        }
        if loser.provider == ProviderKind::Native {
            borrow_structured_fields(&mut winner, &loser);
        }
    }

    winner
}

fn borrow_structured_fields(winner: &mut Candidate, native: &Candidate) {
    if winner.name_first.is_none() {
        winner.name_first = native.name_first.clone();
    }
    if winner.name_last.is_none() {
        winner.name_last = native.name_last.clone();
    }
    if winner.name_full.is_none() {
        winner.name_full = native.name_full.clone();
    }
    if winner.age.is_none() {
        winner.age = native.age;
    }
    if winner.dod.is_none() {
        winner.dod = native.dod.clone();
    }
    if winner.city.is_none() {
        winner.city = native.city.clone();
    }
    if winner.state.is_none() {
        winner.state = native.state.clone();
    }
}
