use std::fmt;

use chrono::{DateTime, Utc};
use corrector_common::{Engagement, ErrorMatch};

/// A candidate that passed the filter: every required field is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub error_match: ErrorMatch,
    pub engagement: Engagement,
}

/// A candidate with its ranking score. Derived per cycle, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Classified result of one reply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Reply posted.
    Success { reply_id: String },
    /// This target can't be corrected (deleted, protected, duplicate...). Try the next one.
    CandidateSpecificFailure(String),
    /// Rate limits, auth, malformed requests. Abort the cycle.
    SystemicFailure(String),
    /// Anything we couldn't classify. Treated like a systemic failure.
    UnknownFailure(String),
}

impl ReplyOutcome {
    pub fn aborts_cycle(&self) -> bool {
        matches!(self, Self::SystemicFailure(_) | Self::UnknownFailure(_))
    }
}

impl fmt::Display for ReplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { reply_id } => write!(f, "success(reply_id={reply_id})"),
            Self::CandidateSpecificFailure(reason) => write!(f, "candidate_specific({reason})"),
            Self::SystemicFailure(reason) => write!(f, "systemic({reason})"),
            Self::UnknownFailure(reason) => write!(f, "unknown({reason})"),
        }
    }
}

/// A successful correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub target_id: String,
    pub reply_id: String,
    pub author: String,
    pub error_match: ErrorMatch,
}

/// Stats from one cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleStats {
    /// The daily quota was already spent; nothing was scraped.
    pub quota_reached: bool,
    pub scraped: usize,
    pub eligible: usize,
    pub attempted: usize,
    pub corrected: Option<String>,
    pub aborted: bool,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quota_reached={} scraped={} eligible={} attempted={} corrected={} aborted={}",
            self.quota_reached,
            self.scraped,
            self.eligible,
            self.attempted,
            self.corrected.as_deref().unwrap_or("none"),
            self.aborted,
        )
    }
}
