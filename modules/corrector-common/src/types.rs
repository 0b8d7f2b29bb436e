use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The dictionary entry a post was matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMatch {
    pub incorrect: String,
    pub correct: String,
}

/// Engagement counters as scraped. Unavailable counters are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub replies: u64,
    pub retweets: u64,
    pub likes: u64,
    pub quotes: u64,
}

/// A scraped post that may receive a correction.
///
/// Scraped data is untrusted: `posted_at` and `error_match` are optional
/// here and validated by the candidate filter, which also rejects ids that
/// are not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub author: String,
    pub text: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub error_match: Option<ErrorMatch>,
    #[serde(default)]
    pub engagement: Engagement,
}

impl CandidateRecord {
    pub fn new(id: impl Into<String>, posted_at: DateTime<Utc>, error_match: ErrorMatch) -> Self {
        Self {
            id: id.into(),
            author: String::new(),
            text: String::new(),
            posted_at: Some(posted_at),
            error_match: Some(error_match),
            engagement: Engagement::default(),
        }
    }

    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}
