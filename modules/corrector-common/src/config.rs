use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use typed_builder::TypedBuilder;

use crate::error::CorrectorError;
use crate::profile::BotProfile;

/// Tunable knobs for one bot. Every field has a default so callers only
/// name what they change.
#[derive(Debug, Clone, TypedBuilder)]
pub struct BotSettings {
    /// Successful corrections allowed per UTC day.
    #[builder(default = 15)]
    pub daily_limit: u32,
    /// Posts more than this many whole days old are skipped.
    #[builder(default = 2)]
    pub max_age_days: i64,
    /// Bound on the recently-processed history.
    #[builder(default = 200)]
    pub max_history: usize,
    /// Score decay constant `k`, per hour of post age.
    #[builder(default = 1.5)]
    pub decay_per_hour: f64,
    /// Floor for any sleep between cycles.
    #[builder(default = 60)]
    pub min_sleep_secs: u64,
    /// Uniform jitter bound applied to the base interval.
    #[builder(default = 300)]
    pub jitter_secs: u64,
    /// Random buffer added past midnight when the quota is exhausted.
    #[builder(default = (60, 300))]
    pub quota_buffer_secs: (u64, u64),
    #[builder(default = 30)]
    pub scrape_max_tweets: u32,
    #[builder(default = "(min_retweets:50 OR min_faves:100)".to_string(), setter(into))]
    pub min_engagement_query: String,
    #[builder(default = "ar".to_string(), setter(into))]
    pub search_lang: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Process configuration: secrets from the environment plus the bot knobs.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile: BotProfile,
    pub apify_api_key: String,
    pub x_access_token: String,
    pub data_dir: PathBuf,
    pub settings: BotSettings,
}

impl Config {
    /// Load `.env` (if present) and read configuration for `profile`.
    /// Per-profile keys (`DAILY_LIMIT_GRAMMAR`) override global ones (`DAILY_LIMIT`).
    pub fn from_env(profile: BotProfile) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(profile, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(profile: BotProfile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { profile, lookup };
        let defaults = BotSettings::default();

        let settings = BotSettings {
            daily_limit: env.parsed("DAILY_LIMIT", defaults.daily_limit)?,
            max_age_days: env.parsed("MAX_TWEET_AGE_DAYS", defaults.max_age_days)?,
            max_history: env.parsed("MAX_HISTORY", defaults.max_history)?,
            decay_per_hour: env.parsed("DECAY_PER_HOUR", defaults.decay_per_hour)?,
            min_sleep_secs: env.parsed("MIN_SLEEP_SECS", defaults.min_sleep_secs)?,
            jitter_secs: env.parsed("JITTER_SECS", defaults.jitter_secs)?,
            quota_buffer_secs: defaults.quota_buffer_secs,
            scrape_max_tweets: env.parsed("SCRAPE_MAX_TWEETS", defaults.scrape_max_tweets)?,
            min_engagement_query: env
                .get("MIN_ENGAGEMENT")
                .unwrap_or(defaults.min_engagement_query),
            search_lang: env.get("SEARCH_LANG").unwrap_or(defaults.search_lang),
        };

        if settings.max_history == 0 {
            return Err(CorrectorError::Config("MAX_HISTORY must be at least 1".into()).into());
        }
        if !settings.decay_per_hour.is_finite() || settings.decay_per_hour < 0.0 {
            return Err(
                CorrectorError::Config("DECAY_PER_HOUR must be a non-negative number".into()).into(),
            );
        }

        Ok(Self {
            profile,
            apify_api_key: env.required_global("APIFY_API_KEY")?,
            x_access_token: env.required_profile("X_ACCESS_TOKEN")?,
            data_dir: PathBuf::from(env.get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            settings,
        })
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(5);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.len())
        }

        let s = &self.settings;
        tracing::info!(profile = %self.profile, "Config loaded:");
        tracing::info!("  APIFY_API_KEY: {}", preview(&self.apify_api_key));
        tracing::info!(
            "  X_ACCESS_TOKEN_{}: {}",
            self.profile.env_suffix(),
            preview(&self.x_access_token)
        );
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!(
            daily_limit = s.daily_limit,
            max_age_days = s.max_age_days,
            max_history = s.max_history,
            decay_per_hour = s.decay_per_hour,
            min_sleep_secs = s.min_sleep_secs,
            jitter_secs = s.jitter_secs,
            scrape_max_tweets = s.scrape_max_tweets,
            min_engagement = s.min_engagement_query.as_str(),
            "  Bot settings"
        );
    }
}

struct EnvReader<F> {
    profile: BotProfile,
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Profile-specific key first, then the global key. Blank values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        let scoped = format!("{key}_{}", self.profile.env_suffix());
        let set = |v: &String| !v.trim().is_empty();
        (self.lookup)(&scoped)
            .filter(set)
            .or_else(|| (self.lookup)(key).filter(set))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                CorrectorError::InvalidEnv {
                    key: key.to_string(),
                    value: raw.clone(),
                }
                .into()
            }),
        }
    }

    fn required_global(&self, key: &str) -> Result<String> {
        (self.lookup)(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CorrectorError::MissingEnv(key.to_string()).into())
    }

    fn required_profile(&self, key: &str) -> Result<String> {
        let scoped = format!("{key}_{}", self.profile.env_suffix());
        (self.lookup)(&scoped)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CorrectorError::MissingEnv(scoped).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRETS: [(&str, &str); 2] = [
        ("APIFY_API_KEY", "apify_test_key"),
        ("X_ACCESS_TOKEN_GRAMMAR", "x_token_grammar"),
    ];

    #[test]
    fn defaults_apply_when_knobs_unset() {
        let config = Config::from_lookup(BotProfile::Grammar, lookup(&SECRETS)).unwrap();
        assert_eq!(config.settings.daily_limit, 15);
        assert_eq!(config.settings.max_history, 200);
        assert_eq!(config.settings.max_age_days, 2);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn profile_override_beats_global() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("DAILY_LIMIT", "10"));
        pairs.push(("DAILY_LIMIT_GRAMMAR", "4"));
        pairs.push(("DAILY_LIMIT_ENGLISH", "9"));
        let config = Config::from_lookup(BotProfile::Grammar, lookup(&pairs)).unwrap();
        assert_eq!(config.settings.daily_limit, 4);
    }

    #[test]
    fn malformed_knob_is_an_error() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("MAX_HISTORY", "lots"));
        let err = Config::from_lookup(BotProfile::Grammar, lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("MAX_HISTORY"));
    }

    #[test]
    fn missing_profile_token_is_an_error() {
        let err = Config::from_lookup(BotProfile::English, lookup(&SECRETS)).unwrap_err();
        assert!(err.to_string().contains("X_ACCESS_TOKEN_ENGLISH"));
    }

    #[test]
    fn zero_history_rejected() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("MAX_HISTORY", "0"));
        assert!(Config::from_lookup(BotProfile::Grammar, lookup(&pairs)).is_err());
    }

    #[test]
    fn builder_overrides_only_named_knobs() {
        let s = BotSettings::builder().max_history(3).daily_limit(1).build();
        assert_eq!(s.max_history, 3);
        assert_eq!(s.daily_limit, 1);
        assert_eq!(s.min_sleep_secs, 60);
        assert_eq!(s.search_lang, "ar");
    }
}
