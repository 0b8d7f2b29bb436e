use std::collections::HashSet;

use chrono::{DateTime, Utc};
use corrector_common::{BotSettings, CandidateRecord};
use tracing::debug;

use crate::state::StateStore;
use crate::types::Candidate;

/// Candidate ids are numeric strings.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `record` may be considered this cycle: required fields present
/// and well-formed, not already processed, and no more than
/// `max_age_days` whole days old.
pub fn is_eligible(
    record: &CandidateRecord,
    store: &StateStore,
    settings: &BotSettings,
    now: DateTime<Utc>,
) -> bool {
    let Some(posted_at) = record.posted_at else {
        debug!(id = record.id.as_str(), "Skipping: no timestamp");
        return false;
    };
    if !is_valid_id(&record.id) {
        debug!(id = record.id.as_str(), "Skipping: malformed id");
        return false;
    }
    if record.error_match.is_none() {
        debug!(id = record.id.as_str(), "Skipping: no dictionary match");
        return false;
    }
    if store.has_processed(&record.id) {
        debug!(id = record.id.as_str(), "Skipping: already processed");
        return false;
    }
    let age_days = (now - posted_at).num_days();
    if age_days > settings.max_age_days {
        debug!(id = record.id.as_str(), age_days, "Skipping: too old");
        return false;
    }
    true
}

/// Filter a scraped batch down to validated candidates. Repeated ids within
/// the batch keep their first occurrence.
pub fn eligible_candidates(
    records: Vec<CandidateRecord>,
    store: &StateStore,
    settings: &BotSettings,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| is_eligible(r, store, settings, now))
        .filter(|r| seen.insert(r.id.clone()))
        .filter_map(|r| {
            Some(Candidate {
                posted_at: r.posted_at?,
                error_match: r.error_match?,
                id: r.id,
                author: r.author,
                text: r.text,
                engagement: r.engagement,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryBackend;
    use chrono::Duration;
    use corrector_common::ErrorMatch;

    fn store() -> StateStore {
        StateStore::load(
            Box::new(MemoryBackend::new()),
            10,
            5,
            Utc::now().date_naive(),
        )
    }

    fn record(id: &str, age: Duration) -> CandidateRecord {
        CandidateRecord::new(
            id,
            Utc::now() - age,
            ErrorMatch {
                incorrect: "لاكن".into(),
                correct: "لكن".into(),
            },
        )
    }

    #[test]
    fn fresh_complete_record_is_eligible() {
        let settings = BotSettings::default();
        assert!(is_eligible(&record("100", Duration::hours(1)), &store(), &settings, Utc::now()));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let settings = BotSettings::default();
        let store = store();
        let now = Utc::now();

        let mut no_time = record("1", Duration::hours(1));
        no_time.posted_at = None;
        assert!(!is_eligible(&no_time, &store, &settings, now));

        let mut no_match = record("2", Duration::hours(1));
        no_match.error_match = None;
        assert!(!is_eligible(&no_match, &store, &settings, now));

        assert!(!is_eligible(&record("", Duration::hours(1)), &store, &settings, now));
        assert!(!is_eligible(&record("12a", Duration::hours(1)), &store, &settings, now));
    }

    #[test]
    fn processed_ids_are_rejected() {
        let settings = BotSettings::default();
        let mut store = store();
        store.mark_processed("77");
        assert!(!is_eligible(&record("77", Duration::hours(1)), &store, &settings, Utc::now()));
    }

    #[test]
    fn age_uses_whole_days() {
        let settings = BotSettings::builder().max_age_days(2).build();
        let store = store();
        let now = Utc::now();
        // 2 days 23 hours truncates to 2 days: still eligible.
        let edge = record("1", Duration::days(2) + Duration::hours(23));
        assert!(is_eligible(&edge, &store, &settings, now));
        let old = record("2", Duration::days(3) + Duration::minutes(1));
        assert!(!is_eligible(&old, &store, &settings, now));
    }

    #[test]
    fn batch_filter_drops_duplicates_and_ineligible() {
        let settings = BotSettings::default();
        let store = store();
        let mut bad = record("3", Duration::hours(1));
        bad.error_match = None;
        let records = vec![
            record("1", Duration::hours(1)),
            record("1", Duration::hours(2)),
            bad,
            record("2", Duration::hours(3)),
        ];
        let out = eligible_candidates(records, &store, &settings, Utc::now());
        let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
