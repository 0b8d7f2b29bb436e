pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{RunData, Tweet, TweetAuthor, TweetSearchInput};

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for apidojo/tweet-scraper.
const TWEET_SCRAPER: &str = "61RPP7dywgiy0JPD0";

/// Default ceiling on how long to wait for a run before giving up.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    max_wait: Duration,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Point the client at a different API root (local stubs, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Start a tweet search run. Returns immediately with run metadata.
    pub async fn start_tweet_search(&self, input: &TweetSearchInput) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, TWEET_SCRAPER);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes, using `waitForFinish=60` long-polling.
    /// Gives up with [`ApifyError::Timeout`] once `max_wait` has elapsed.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        let started = Instant::now();
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ApifyError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let api_resp: ApiResponse<RunData> = resp.json().await?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(api_resp.data.status));
                }
                _ if started.elapsed() >= self.max_wait => {
                    return Err(ApifyError::Timeout {
                        run_id: run_id.to_string(),
                        status: api_resp.data.status,
                        waited_secs: started.elapsed().as_secs(),
                    });
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Search tweets end-to-end: start run, poll, fetch results.
    pub async fn search_tweets(&self, query: &str, limit: u32) -> Result<Vec<Tweet>> {
        tracing::info!(query, limit, "Starting tweet search");

        let input = TweetSearchInput {
            search_terms: vec![query.to_string()],
            max_items: limit,
            sort: "Latest".to_string(),
        };

        let run = self.start_tweet_search(&input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let tweets: Vec<Tweet> = self
            .get_dataset_items(&completed.default_dataset_id)
            .await?;
        tracing::info!(count = tweets.len(), "Fetched tweets");

        Ok(tweets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run(status: &str) -> serde_json::Value {
        serde_json::json!({
            "data": {"id": "run-1", "status": status, "defaultDatasetId": "ds-1"}
        })
    }

    async fn mount_start(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(format!("/acts/{TWEET_SCRAPER}/runs")))
            .respond_with(ResponseTemplate::new(201).set_body_json(run("READY")))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn search_tweets_runs_actor_and_reads_dataset() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/run-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run("SUCCEEDED")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/ds-1/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "1", "fullText": "لاكن", "likeCount": 3},
                {"id": "2", "text": "second"}
            ])))
            .mount(&server)
            .await;

        let client = ApifyClient::new("token".into()).with_base_url(server.uri());
        let tweets = client.search_tweets("lang:ar", 10).await.unwrap();
        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].like_count, Some(3));
        assert_eq!(tweets[1].content(), Some("second"));
    }

    #[tokio::test]
    async fn failed_run_is_reported() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/run-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run("FAILED")))
            .mount(&server)
            .await;

        let client = ApifyClient::new("token".into()).with_base_url(server.uri());
        let err = client.search_tweets("lang:ar", 10).await.unwrap_err();
        assert!(matches!(err, ApifyError::RunFailed(s) if s == "FAILED"));
    }

    #[tokio::test]
    async fn slow_run_times_out() {
        let server = MockServer::start().await;
        mount_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/run-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run("RUNNING")))
            .mount(&server)
            .await;

        let client = ApifyClient::new("token".into())
            .with_base_url(server.uri())
            .with_max_wait(Duration::ZERO);
        let err = client.search_tweets("lang:ar", 10).await.unwrap_err();
        assert!(matches!(err, ApifyError::Timeout { ref run_id, .. } if run_id == "run-1"));
    }

    #[tokio::test]
    async fn api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/acts/{TWEET_SCRAPER}/runs")))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client = ApifyClient::new("bad".into()).with_base_url(server.uri());
        let err = client.search_tweets("lang:ar", 10).await.unwrap_err();
        assert!(matches!(err, ApifyError::Api { status: 401, ref message } if message == "invalid token"));
    }
}
