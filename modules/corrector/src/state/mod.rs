//! Durable per-bot state: the bounded history of attempted candidate ids
//! and the per-day correction counter.
//!
//! Every mutator takes `&mut self` and saves before returning, so a mutation
//! and its save are one exclusive section.

mod backend;
mod file;
mod memory;

pub use backend::{LoadOutcome, StateBackend, StateError, StateFile};
pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

/// In-memory form of a bot's state. Insertion-ordered history with O(1) membership.
#[derive(Debug, Clone, PartialEq)]
pub struct BotState {
    recent: VecDeque<String>,
    members: HashSet<String>,
    daily_count: u32,
    count_reset_date: NaiveDate,
}

impl BotState {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            recent: VecDeque::new(),
            members: HashSet::new(),
            daily_count: 0,
            count_reset_date: today,
        }
    }

    /// Rebuild from the stored form, dropping duplicate ids and trimming the
    /// oldest entries if the history bound shrank since the file was written.
    pub fn from_file(file: StateFile, max_history: usize) -> Self {
        let mut state = Self {
            recent: VecDeque::with_capacity(file.processed_ids.len()),
            members: HashSet::with_capacity(file.processed_ids.len()),
            daily_count: file.daily_count,
            count_reset_date: file.last_reset_date,
        };
        for id in file.processed_ids {
            if state.members.insert(id.clone()) {
                state.recent.push_back(id);
            }
        }
        state.evict_over(max_history);
        state
    }

    pub fn to_file(&self) -> StateFile {
        StateFile {
            last_reset_date: self.count_reset_date,
            daily_count: self.daily_count,
            processed_ids: self.recent.iter().cloned().collect(),
        }
    }

    fn evict_over(&mut self, max_history: usize) -> usize {
        let mut evicted = 0;
        while self.recent.len() > max_history {
            if let Some(oldest) = self.recent.pop_front() {
                self.members.remove(&oldest);
                evicted += 1;
            }
        }
        evicted
    }
}

pub struct StateStore {
    backend: Box<dyn StateBackend>,
    state: BotState,
    max_history: usize,
    daily_limit: u32,
    /// Stored bytes exist that we couldn't read or preserve. Saving would
    /// overwrite them, so saves wait until the backend reports them gone or
    /// backed up.
    guard_stored: bool,
}

impl StateStore {
    /// Load state from `backend`. Never fails: a missing or corrupt store
    /// yields a fresh state (corrupt bytes are preserved by the backend).
    pub fn load(
        backend: Box<dyn StateBackend>,
        max_history: usize,
        daily_limit: u32,
        today: NaiveDate,
    ) -> Self {
        let max_history = max_history.max(1);
        let location = backend.describe();

        let (state, persist, guard_stored) = match backend.load() {
            Ok(LoadOutcome::Loaded(file)) => {
                let state = BotState::from_file(file, max_history);
                info!(
                    location = location.as_str(),
                    history = state.recent.len(),
                    daily_count = state.daily_count,
                    count_date = %state.count_reset_date,
                    "Loaded bot state"
                );
                (state, false, false)
            }
            Ok(LoadOutcome::Missing) => {
                info!(location = location.as_str(), "No stored state, starting fresh");
                (BotState::fresh(today), true, false)
            }
            Ok(LoadOutcome::Corrupt { backup, reason }) => {
                error!(
                    location = location.as_str(),
                    backup = backup.as_str(),
                    reason = reason.as_str(),
                    "Stored state is corrupt; preserved it and starting fresh"
                );
                (BotState::fresh(today), true, false)
            }
            Err(e) => {
                error!(
                    location = location.as_str(),
                    error = %e,
                    "Failed to read stored state; starting fresh without overwriting it"
                );
                (BotState::fresh(today), false, true)
            }
        };

        let mut store = Self {
            backend,
            state,
            max_history,
            daily_limit,
            guard_stored,
        };
        if persist {
            store.save();
        }
        store
    }

    /// Persist the current state. Failures are logged; in-memory state stays
    /// authoritative and the next mutation retries.
    ///
    /// While stored bytes are unread and unpreserved, each save first asks
    /// the backend again; it goes ahead only once they are gone or backed up.
    pub fn save(&mut self) -> bool {
        if self.guard_stored && !self.release_guard() {
            error!(
                location = self.backend.describe().as_str(),
                "Not saving over unpreserved stored state; keeping state in memory"
            );
            return false;
        }
        match self.backend.save(&self.state.to_file()) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    location = self.backend.describe().as_str(),
                    error = %e,
                    "Failed to save bot state; a crash before the next save may repeat an attempt"
                );
                false
            }
        }
    }

    fn release_guard(&mut self) -> bool {
        match self.backend.load() {
            Ok(LoadOutcome::Missing) => {}
            Ok(LoadOutcome::Corrupt { backup, .. }) => {
                info!(backup = backup.as_str(), "Preserved previously unreadable state");
            }
            // Readable again, or still failing: leave it for the next restart.
            Ok(LoadOutcome::Loaded(_)) | Err(_) => return false,
        }
        self.guard_stored = false;
        true
    }

    /// Whether saves are held back to protect unpreserved stored state.
    pub fn is_save_guarded(&self) -> bool {
        self.guard_stored
    }

    pub fn has_processed(&self, id: &str) -> bool {
        self.state.members.contains(id)
    }

    /// Record `id` as attempted. No-op if already present; otherwise appends,
    /// evicts the oldest entries past the bound and saves.
    /// Returns whether the id was new.
    pub fn mark_processed(&mut self, id: &str) -> bool {
        if !self.state.members.insert(id.to_string()) {
            debug!(id, "Already in processed history");
            return false;
        }
        self.state.recent.push_back(id.to_string());
        let evicted = self.state.evict_over(self.max_history);
        if evicted > 0 {
            debug!(evicted, max_history = self.max_history, "Evicted oldest history entries");
        }
        self.save();
        true
    }

    /// Reset the daily counter if `today` is not the counter's date. Saves on reset.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.state.count_reset_date == today {
            return false;
        }
        info!(
            previous_date = %self.state.count_reset_date,
            previous_count = self.state.daily_count,
            today = %today,
            "New day, resetting daily correction count"
        );
        self.state.daily_count = 0;
        self.state.count_reset_date = today;
        self.save();
        true
    }

    pub fn is_quota_reached(&mut self, today: NaiveDate) -> bool {
        self.roll_over(today);
        self.state.daily_count >= self.daily_limit
    }

    pub fn remaining_quota(&mut self, today: NaiveDate) -> u32 {
        self.roll_over(today);
        self.daily_limit.saturating_sub(self.state.daily_count)
    }

    pub fn increment_daily_count(&mut self, today: NaiveDate) {
        self.roll_over(today);
        self.state.daily_count = self.state.daily_count.saturating_add(1);
        if self.state.daily_count > self.daily_limit {
            warn!(
                daily_count = self.state.daily_count,
                daily_limit = self.daily_limit,
                "Daily count exceeds the configured limit"
            );
        }
        self.save();
    }

    pub fn daily_count(&self) -> u32 {
        self.state.daily_count
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn count_reset_date(&self) -> NaiveDate {
        self.state.count_reset_date
    }

    pub fn history_len(&self) -> usize {
        self.state.recent.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// History ids, oldest first.
    pub fn processed_ids(&self) -> impl Iterator<Item = &str> {
        self.state.recent.iter().map(String::as_str)
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }
}
