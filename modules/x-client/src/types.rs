use serde::{Deserialize, Serialize};

/// Wrapper for X API v2 success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
}

/// Body for `POST /2/tweets`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTweetRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplySettings>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplySettings {
    pub in_reply_to_tweet_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Error body. X returns either an RFC 7807 problem or an `errors` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemBody {
    pub title: Option<String>,
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Vec<ProblemEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemEntry {
    pub message: Option<String>,
    pub detail: Option<String>,
}

impl ProblemBody {
    /// Best human-readable detail, falling back to the raw body.
    pub fn detail_or(&self, raw: &str) -> String {
        if let Some(d) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            return d.to_string();
        }
        let joined = self
            .errors
            .iter()
            .filter_map(|e| e.detail.as_deref().or(e.message.as_deref()))
            .collect::<Vec<_>>()
            .join("; ");
        if !joined.is_empty() {
            return joined;
        }
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_request_shape() {
        let req = CreateTweetRequest {
            text: "fix".into(),
            reply: Some(ReplySettings {
                in_reply_to_tweet_id: "123".into(),
            }),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["reply"]["in_reply_to_tweet_id"], "123");
        assert_eq!(v["text"], "fix");
    }

    #[test]
    fn problem_detail_prefers_detail_field() {
        let body: ProblemBody = serde_json::from_str(
            r#"{"title":"Forbidden","detail":"You are not allowed to create a Tweet with duplicate content.","status":403}"#,
        )
        .unwrap();
        assert!(body.detail_or("raw").contains("duplicate content"));
    }

    #[test]
    fn problem_detail_joins_errors_array() {
        let body: ProblemBody =
            serde_json::from_str(r#"{"errors":[{"message":"first"},{"message":"second"}]}"#).unwrap();
        assert_eq!(body.detail_or("raw"), "first; second");
    }

    #[test]
    fn problem_detail_falls_back_to_raw() {
        assert_eq!(ProblemBody::default().detail_or("raw body"), "raw body");
    }
}
