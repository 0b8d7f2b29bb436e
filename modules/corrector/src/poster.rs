use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;
use x_client::{CreatedTweet, XClient, XError};

use crate::traits::ReplyPoster;
use crate::types::ReplyOutcome;

/// 403 phrases that point at the target post or its author rather than at
/// our account or request. Matched against the lowercased title and detail.
const CANDIDATE_SPECIFIC_403: &[&str] = &[
    "you are not allowed to reply",
    "reply to this conversation is not allowed",
    "cannot reply to users who protect their tweets",
    "user is suspended",
    "you are unable to perform this action",
    "cannot send replies to the users who are not following you",
    "not allowed to create a tweet with duplicate content",
];

/// Posts replies through the X API.
pub struct XReplyPoster {
    client: XClient,
}

impl XReplyPoster {
    pub fn new(client: XClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplyPoster for XReplyPoster {
    async fn post_reply(&self, target_id: &str, message: &str) -> Result<ReplyOutcome> {
        let result = self.client.create_reply(target_id, message).await;
        let outcome = classify(result);
        debug!(target_id, outcome = %outcome, "Reply attempt classified");
        Ok(outcome)
    }
}

/// Map an X API result to a reply outcome.
///
/// 404 and target-related 403s are candidate-specific. Auth, rate limits,
/// bad requests, server errors and transport failures are systemic. A
/// success body without an id can't be trusted either way.
pub fn classify(result: std::result::Result<CreatedTweet, XError>) -> ReplyOutcome {
    match result {
        Ok(tweet) if !tweet.id.trim().is_empty() => ReplyOutcome::Success { reply_id: tweet.id },
        Ok(_) => ReplyOutcome::UnknownFailure("reply created without an id".to_string()),
        Err(XError::Parse(msg)) => ReplyOutcome::UnknownFailure(format!("unreadable response: {msg}")),
        Err(XError::Network(msg)) => ReplyOutcome::SystemicFailure(format!("network: {msg}")),
        Err(XError::Api { status, title, detail }) => {
            let reason = format!("{status} {title}: {detail}");
            match status {
                404 => ReplyOutcome::CandidateSpecificFailure(reason),
                403 if is_candidate_specific_403(&title, &detail) => {
                    ReplyOutcome::CandidateSpecificFailure(reason)
                }
                _ => ReplyOutcome::SystemicFailure(reason),
            }
        }
    }
}

fn is_candidate_specific_403(title: &str, detail: &str) -> bool {
    let text = format!("{title} {detail}").to_lowercase();
    CANDIDATE_SPECIFIC_403.iter().any(|needle| text.contains(needle))
}
