use std::collections::HashSet;

use anyhow::{Context, Result};
use apify_client::{ApifyClient, Tweet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corrector_common::{BotSettings, CandidateRecord, Engagement, ErrorDictionary};
use tracing::{debug, info};

use crate::traits::CandidateSource;

/// Twitter's legacy timestamp format: `Wed Oct 10 20:19:24 +0000 2018`.
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Searches X through the Apify tweet scraper for posts containing any of
/// the dictionary's incorrect forms.
pub struct ApifyScraper {
    client: ApifyClient,
    dictionary: ErrorDictionary,
    query: String,
    max_tweets: u32,
}

impl ApifyScraper {
    pub fn new(client: ApifyClient, dictionary: ErrorDictionary, settings: &BotSettings) -> Self {
        let query = dictionary.search_query(&settings.min_engagement_query, &settings.search_lang);
        Self {
            client,
            dictionary,
            query,
            max_tweets: settings.scrape_max_tweets,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl CandidateSource for ApifyScraper {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateRecord>> {
        debug!(query = self.query.as_str(), "Searching tweets");
        let tweets = self
            .client
            .search_tweets(&self.query, self.max_tweets)
            .await
            .context("Apify tweet search failed")?;

        let fetched = tweets.len();
        let records = to_records(tweets, &self.dictionary, self.max_tweets as usize);
        info!(fetched, kept = records.len(), "Scraped tweets");
        Ok(records)
    }
}

/// Map a scraped batch to candidate records, dropping repeated ids and
/// capping at `max`.
pub fn to_records(tweets: Vec<Tweet>, dictionary: &ErrorDictionary, max: usize) -> Vec<CandidateRecord> {
    let mut seen = HashSet::new();
    tweets
        .iter()
        .filter_map(|t| to_record(t, dictionary))
        .filter(|r| seen.insert(r.id.clone()))
        .take(max)
        .collect()
}

/// One tweet as a candidate record. `None` for retweets, tweets without an
/// id, and tweets with no dictionary match. Unparseable timestamps leave
/// `posted_at` empty so the filter rejects the record.
pub fn to_record(tweet: &Tweet, dictionary: &ErrorDictionary) -> Option<CandidateRecord> {
    let id = tweet.id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
    let text = tweet.content().unwrap_or_default();
    if is_retweet(tweet, text) {
        return None;
    }
    let error_match = dictionary.first_match(text)?;

    let posted_at = tweet.created_at.as_deref().and_then(parse_timestamp);
    if posted_at.is_none() {
        debug!(id, raw = ?tweet.created_at, "Unparseable tweet timestamp");
    }

    Some(CandidateRecord {
        id: id.to_string(),
        author: tweet.author_handle().unwrap_or_default().to_string(),
        text: text.to_string(),
        posted_at,
        error_match: Some(error_match),
        engagement: Engagement {
            replies: count(tweet.reply_count),
            retweets: count(tweet.retweet_count),
            likes: count(tweet.like_count),
            quotes: count(tweet.quote_count),
        },
    })
}

fn is_retweet(tweet: &Tweet, text: &str) -> bool {
    tweet.is_retweet.unwrap_or(false) || text.starts_with("RT @")
}

fn count(value: Option<i64>) -> u64 {
    value.map(|v| v.max(0) as u64).unwrap_or(0)
}

/// Parse either Twitter's legacy format or RFC 3339. Offsets are honored
/// and the result converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
