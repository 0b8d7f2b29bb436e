// Trait seams for the correction cycle.
//
// CandidateSource: scraping (Apify in production).
// ReplyPoster: posting + outcome classification (X API in production).
// MessageComposer: correction text.
//
// MockScraper and ScriptedPoster in `testing` stand in for the first two so
// cycles run without network access.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use corrector_common::{CandidateRecord, ErrorMatch};

use crate::types::ReplyOutcome;

#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Recent posts matching the profile's dictionary. Records are
    /// unvalidated; the filter decides what's usable.
    async fn fetch_candidates(&self) -> Result<Vec<CandidateRecord>>;
}

#[async_trait]
pub trait ReplyPoster: Send + Sync {
    /// Post `message` as a reply to `target_id` and classify the result.
    /// An `Err` here means the attempt couldn't be classified and is
    /// treated as [`ReplyOutcome::UnknownFailure`].
    async fn post_reply(&self, target_id: &str, message: &str) -> Result<ReplyOutcome>;
}

pub trait MessageComposer: Send + Sync {
    fn compose(&self, error_match: &ErrorMatch) -> String;
}

#[async_trait]
impl<T: CandidateSource + ?Sized> CandidateSource for Arc<T> {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateRecord>> {
        (**self).fetch_candidates().await
    }
}

#[async_trait]
impl<T: ReplyPoster + ?Sized> ReplyPoster for Arc<T> {
    async fn post_reply(&self, target_id: &str, message: &str) -> Result<ReplyOutcome> {
        (**self).post_reply(target_id, message).await
    }
}
