use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::state::StateStore;
use crate::traits::{MessageComposer, ReplyPoster};
use crate::types::{Correction, ReplyOutcome, ScoredCandidate};

/// What happened when walking the ranked list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttemptReport {
    pub corrected: Option<Correction>,
    pub attempted: usize,
    pub aborted: bool,
}

/// Walk `ranked` best-first until one reply lands.
///
/// Each candidate is marked processed before its attempt, whatever the
/// outcome, so a crash mid-post can't lead to a double reply. A
/// candidate-specific failure moves on to the next candidate; systemic and
/// unknown failures end the walk. At most one correction per call.
pub async fn attempt_corrections(
    ranked: &[ScoredCandidate],
    store: &mut StateStore,
    poster: &dyn ReplyPoster,
    composer: &dyn MessageComposer,
    today: NaiveDate,
) -> AttemptReport {
    let mut report = AttemptReport::default();

    for scored in ranked {
        let candidate = &scored.candidate;
        store.mark_processed(&candidate.id);
        report.attempted += 1;

        let message = composer.compose(&candidate.error_match);
        let outcome = match poster.post_reply(&candidate.id, &message).await {
            Ok(outcome) => outcome,
            Err(e) => ReplyOutcome::UnknownFailure(format!("{e:#}")),
        };

        match outcome {
            ReplyOutcome::Success { reply_id } => {
                store.increment_daily_count(today);
                info!(
                    target_id = candidate.id.as_str(),
                    reply_id = reply_id.as_str(),
                    score = scored.score,
                    daily_count = store.daily_count(),
                    "Correction posted"
                );
                report.corrected = Some(Correction {
                    target_id: candidate.id.clone(),
                    reply_id,
                    author: candidate.author.clone(),
                    error_match: candidate.error_match.clone(),
                });
                break;
            }
            ReplyOutcome::CandidateSpecificFailure(reason) => {
                warn!(
                    target_id = candidate.id.as_str(),
                    reason = reason.as_str(),
                    "Candidate can't be corrected, trying next"
                );
            }
            other => {
                error!(
                    target_id = candidate.id.as_str(),
                    outcome = %other,
                    "Reply failed, ending cycle"
                );
                report.aborted = true;
                break;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::TemplateComposer;
    use crate::state::MemoryBackend;
    use crate::testing::{scored, ScriptedPoster};
    use chrono::Utc;

    fn store() -> StateStore {
        StateStore::load(Box::new(MemoryBackend::new()), 50, 10, Utc::now().date_naive())
    }

    #[tokio::test]
    async fn stops_after_first_success() {
        let mut store = store();
        let poster = ScriptedPoster::new().success("1", "r1").success("2", "r2");
        let ranked = vec![scored("1", 10.0), scored("2", 5.0)];

        let report =
            attempt_corrections(&ranked, &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;

        assert_eq!(report.attempted, 1);
        assert!(!report.aborted);
        assert_eq!(report.corrected.map(|c| c.reply_id), Some("r1".to_string()));
        assert_eq!(poster.attempted_ids(), vec!["1"]);
        assert_eq!(store.daily_count(), 1);
        assert!(!store.has_processed("2"));
    }

    #[tokio::test]
    async fn candidate_specific_failure_falls_through() {
        let mut store = store();
        let poster = ScriptedPoster::new()
            .candidate_specific("1", "tweet deleted")
            .success("2", "r2");
        let ranked = vec![scored("1", 10.0), scored("2", 5.0)];

        let report =
            attempt_corrections(&ranked, &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.corrected.map(|c| c.target_id), Some("2".to_string()));
        assert!(store.has_processed("1"));
        assert!(store.has_processed("2"));
        assert_eq!(store.daily_count(), 1);
    }

    #[tokio::test]
    async fn systemic_failure_aborts() {
        let mut store = store();
        let poster = ScriptedPoster::new()
            .systemic("1", "429 rate limited")
            .success("2", "r2");
        let ranked = vec![scored("1", 10.0), scored("2", 5.0)];

        let report =
            attempt_corrections(&ranked, &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;

        assert!(report.aborted);
        assert!(report.corrected.is_none());
        assert_eq!(poster.attempted_ids(), vec!["1"]);
        assert!(store.has_processed("1"));
        assert!(!store.has_processed("2"));
        assert_eq!(store.daily_count(), 0);
    }

    #[tokio::test]
    async fn poster_error_is_unknown_and_aborts() {
        let mut store = store();
        let poster = ScriptedPoster::new().error("1", "connection reset");
        let ranked = vec![scored("1", 10.0), scored("2", 5.0)];

        let report =
            attempt_corrections(&ranked, &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;

        assert!(report.aborted);
        assert_eq!(report.attempted, 1);
        assert!(store.has_processed("1"));
    }

    #[tokio::test]
    async fn exhausted_list_without_success() {
        let mut store = store();
        let poster = ScriptedPoster::new()
            .candidate_specific("1", "protected")
            .candidate_specific("2", "not found");
        let ranked = vec![scored("1", 10.0), scored("2", 5.0)];

        let report =
            attempt_corrections(&ranked, &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;

        assert_eq!(report.attempted, 2);
        assert!(!report.aborted);
        assert!(report.corrected.is_none());
        assert_eq!(store.daily_count(), 0);
    }

    #[tokio::test]
    async fn empty_list_is_noop() {
        let mut store = store();
        let poster = ScriptedPoster::new();
        let report =
            attempt_corrections(&[], &mut store, &poster, &TemplateComposer, Utc::now().date_naive()).await;
        assert_eq!(report, AttemptReport::default());
        assert_eq!(store.history_len(), 0);
    }
}
