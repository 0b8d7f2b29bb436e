pub mod error;
pub mod types;

pub use error::{Result, XError};
pub use types::{CreatedTweet, User};

use serde::de::DeserializeOwned;
use types::{ApiResponse, CreateTweetRequest, ProblemBody, ReplySettings};

const BASE_URL: &str = "https://api.x.com/2";

/// Minimal X API v2 client acting on behalf of one account.
///
/// Authenticates with an OAuth 2.0 user-context access token.
pub struct XClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl XClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The authenticated account. Used to verify credentials at startup.
    pub async fn me(&self) -> Result<User> {
        let url = format!("{}/users/me", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::read_data(resp).await
    }

    /// Post `text` as a reply to `in_reply_to`. Returns the created tweet.
    pub async fn create_reply(&self, in_reply_to: &str, text: &str) -> Result<CreatedTweet> {
        let url = format!("{}/tweets", self.base_url);
        let body = CreateTweetRequest {
            text: text.to_string(),
            reply: Some(ReplySettings {
                in_reply_to_tweet_id: in_reply_to.to_string(),
            }),
        };

        tracing::debug!(in_reply_to, "Posting reply");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::read_data(resp).await
    }

    async fn read_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let problem: ProblemBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(XError::Api {
                status: status.as_u16(),
                title: problem
                    .title
                    .clone()
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
                detail: problem.detail_or(&body),
            });
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
        parsed
            .data
            .ok_or_else(|| XError::Parse(format!("response has no data: {body}")))
    }
}
