use chrono::{DateTime, Utc};
use corrector_common::{BotProfile, BotSettings};
use tracing::{info, warn, Instrument};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::attempt::attempt_corrections;
use crate::composer::TemplateComposer;
use crate::filter::eligible_candidates;
use crate::journal::CorrectionJournal;
use crate::scorer::rank;
use crate::state::StateStore;
use crate::traits::{CandidateSource, MessageComposer, ReplyPoster};
use crate::types::CycleStats;

/// External collaborators of a bot.
#[derive(TypedBuilder)]
pub struct BotDeps {
    pub scraper: Box<dyn CandidateSource>,
    pub poster: Box<dyn ReplyPoster>,
    #[builder(default = Box::new(TemplateComposer) as Box<dyn MessageComposer>)]
    pub composer: Box<dyn MessageComposer>,
    #[builder(default = CorrectionJournal::disabled())]
    pub journal: CorrectionJournal,
}

/// One profile's correction bot. Owns its state exclusively; a cycle takes
/// `&mut self`, so two cycles of the same bot can never interleave.
pub struct CorrectionBot {
    profile: BotProfile,
    settings: BotSettings,
    store: StateStore,
    deps: BotDeps,
}

impl CorrectionBot {
    pub fn new(profile: BotProfile, settings: BotSettings, store: StateStore, deps: BotDeps) -> Self {
        Self {
            profile,
            settings,
            store,
            deps,
        }
    }

    pub fn profile(&self) -> BotProfile {
        self.profile
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Run one cycle: quota check, scrape, filter, rank, then at most one
    /// correction. Scrape failures count as an empty batch.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleStats {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("cycle", profile = %self.profile, run_id = run_id.as_str());
        self.run_cycle_inner(&run_id, now).instrument(span).await
    }

    async fn run_cycle_inner(&mut self, run_id: &str, now: DateTime<Utc>) -> CycleStats {
        let mut stats = CycleStats::default();
        let today = now.date_naive();

        if self.store.is_quota_reached(today) {
            info!(
                daily_count = self.store.daily_count(),
                daily_limit = self.store.daily_limit(),
                "Daily quota reached, skipping cycle"
            );
            stats.quota_reached = true;
            return stats;
        }

        let records = match self.deps.scraper.fetch_candidates().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Scrape failed, treating as no candidates");
                Vec::new()
            }
        };
        stats.scraped = records.len();

        let candidates = eligible_candidates(records, &self.store, &self.settings, now);
        stats.eligible = candidates.len();
        if candidates.is_empty() {
            info!(%stats, "No eligible candidates");
            return stats;
        }

        let ranked = rank(candidates, self.settings.decay_per_hour, now);
        let report = attempt_corrections(
            &ranked,
            &mut self.store,
            self.deps.poster.as_ref(),
            self.deps.composer.as_ref(),
            today,
        )
        .await;

        stats.attempted = report.attempted;
        stats.aborted = report.aborted;
        if let Some(correction) = &report.corrected {
            self.deps.journal.record(run_id, correction, now);
            stats.corrected = Some(correction.target_id.clone());
        }

        info!(%stats, daily_count = self.store.daily_count(), "Cycle complete");
        stats
    }
}
