use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use corrector_common::Engagement;

use crate::types::{Candidate, ScoredCandidate};

/// Engagement before decay: likes + 1.5·retweets + 0.5·quotes.
pub fn raw_engagement(e: &Engagement) -> f64 {
    e.likes as f64 + 1.5 * e.retweets as f64 + 0.5 * e.quotes as f64
}

/// `raw · exp(-k · age_hours)`, with age clamped at zero for future timestamps.
pub fn score(candidate: &Candidate, decay_per_hour: f64, now: DateTime<Utc>) -> f64 {
    let age_hours = ((now - candidate.posted_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    raw_engagement(&candidate.engagement) * (-decay_per_hour * age_hours).exp()
}

/// Score and order candidates best-first. Ties go to the smaller id
/// (numeric order, ids being digit strings), so ordering is deterministic.
pub fn rank(candidates: Vec<Candidate>, decay_per_hour: f64, now: DateTime<Utc>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| ScoredCandidate {
            score: score(&candidate, decay_per_hour, now),
            candidate,
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| cmp_ids(a.id(), b.id())));
    scored
}

fn cmp_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
