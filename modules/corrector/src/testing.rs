// Test doubles for the correction cycle.
//
// - MockScraper (CandidateSource): canned batch, swappable between cycles
// - ScriptedPoster (ReplyPoster): per-id outcomes, records every attempt
//
// Plus helpers for building records and scored candidates.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use corrector_common::{CandidateRecord, Engagement, ErrorMatch};

use crate::traits::{CandidateSource, ReplyPoster};
use crate::types::{Candidate, ReplyOutcome, ScoredCandidate};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

pub struct MockScraper {
    batch: Mutex<Result<Vec<CandidateRecord>, String>>,
    calls: Mutex<usize>,
}

impl MockScraper {
    pub fn new(records: Vec<CandidateRecord>) -> Self {
        Self {
            batch: Mutex::new(Ok(records)),
            calls: Mutex::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Every fetch fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            batch: Mutex::new(Err(message.to_string())),
            calls: Mutex::new(0),
        }
    }

    pub fn set_records(&self, records: Vec<CandidateRecord>) {
        *lock(&self.batch) = Ok(records);
    }

    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl CandidateSource for MockScraper {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateRecord>> {
        *lock(&self.calls) += 1;
        match &*lock(&self.batch) {
            Ok(records) => Ok(records.clone()),
            Err(message) => bail!("{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedPoster
// ---------------------------------------------------------------------------

enum Script {
    Outcome(ReplyOutcome),
    Error(String),
}

/// Returns the scripted outcome for each target id. Unscripted ids succeed
/// when built with `always_succeeding`, otherwise error.
pub struct ScriptedPoster {
    scripts: HashMap<String, Script>,
    succeed_unscripted: bool,
    attempts: Mutex<Vec<(String, String)>>,
}

impl ScriptedPoster {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            succeed_unscripted: false,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Every unscripted id succeeds with reply id `reply-{id}`.
    pub fn always_succeeding() -> Self {
        let mut poster = Self::new();
        poster.succeed_unscripted = true;
        poster
    }

    pub fn success(self, id: &str, reply_id: &str) -> Self {
        self.on(
            id,
            ReplyOutcome::Success {
                reply_id: reply_id.to_string(),
            },
        )
    }

    pub fn candidate_specific(self, id: &str, reason: &str) -> Self {
        self.on(id, ReplyOutcome::CandidateSpecificFailure(reason.to_string()))
    }

    pub fn systemic(self, id: &str, reason: &str) -> Self {
        self.on(id, ReplyOutcome::SystemicFailure(reason.to_string()))
    }

    /// `post_reply` returns `Err` for this id.
    pub fn error(mut self, id: &str, message: &str) -> Self {
        self.scripts
            .insert(id.to_string(), Script::Error(message.to_string()));
        self
    }

    fn on(mut self, id: &str, outcome: ReplyOutcome) -> Self {
        self.scripts.insert(id.to_string(), Script::Outcome(outcome));
        self
    }

    /// Target ids in attempt order.
    pub fn attempted_ids(&self) -> Vec<String> {
        lock(&self.attempts).iter().map(|(id, _)| id.clone()).collect()
    }

    /// Messages in attempt order.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.attempts).iter().map(|(_, m)| m.clone()).collect()
    }
}

impl Default for ScriptedPoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyPoster for ScriptedPoster {
    async fn post_reply(&self, target_id: &str, message: &str) -> Result<ReplyOutcome> {
        lock(&self.attempts).push((target_id.to_string(), message.to_string()));
        match self.scripts.get(target_id) {
            Some(Script::Outcome(outcome)) => Ok(outcome.clone()),
            Some(Script::Error(message)) => bail!("{message}"),
            None if self.succeed_unscripted => Ok(ReplyOutcome::Success {
                reply_id: format!("reply-{target_id}"),
            }),
            None => bail!("no scripted outcome for {target_id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn sample_match() -> ErrorMatch {
    ErrorMatch {
        incorrect: "لاكن".to_string(),
        correct: "لكن".to_string(),
    }
}

/// A complete record posted `age` before `now` with `likes` likes.
pub fn record_at(id: &str, likes: u64, age: Duration, now: DateTime<Utc>) -> CandidateRecord {
    CandidateRecord::new(id, now - age, sample_match())
        .with_author(format!("user{id}"))
        .with_text(format!("post {id} لاكن"))
        .with_engagement(Engagement {
            likes,
            ..Default::default()
        })
}

pub fn record(id: &str, likes: u64) -> CandidateRecord {
    record_at(id, likes, Duration::zero(), Utc::now())
}

pub fn scored(id: &str, score: f64) -> ScoredCandidate {
    ScoredCandidate {
        candidate: Candidate {
            id: id.to_string(),
            author: format!("user{id}"),
            text: String::new(),
            posted_at: Utc::now(),
            error_match: sample_match(),
            engagement: Engagement::default(),
        },
        score,
    }
}
