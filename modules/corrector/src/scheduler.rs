use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corrector_common::BotSettings;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

use crate::bot::CorrectionBot;
use crate::types::CycleStats;

const SECS_PER_DAY: u64 = 86_400;

/// How long to wait before the next cycle, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepPlan {
    /// Quota spent: wait past the next UTC midnight.
    UntilReset(Duration),
    /// Spread the remaining quota over what's left of the day.
    Interval(Duration),
}

impl SleepPlan {
    pub fn duration(&self) -> Duration {
        match self {
            Self::UntilReset(d) | Self::Interval(d) => *d,
        }
    }
}

/// Whole seconds from `now` to the next UTC midnight.
pub fn seconds_until_midnight(now: DateTime<Utc>) -> u64 {
    now.date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|midnight| (midnight.and_utc() - now).num_seconds().max(0) as u64)
        .unwrap_or(0)
}

/// Sleep for an exhausted quota: until midnight plus a random buffer,
/// never below the minimum sleep.
pub fn quota_sleep(now: DateTime<Utc>, settings: &BotSettings, rng: &mut impl Rng) -> Duration {
    let (a, b) = settings.quota_buffer_secs;
    let buffer = rng.random_range(a.min(b)..=a.max(b));
    let secs = (seconds_until_midnight(now) + buffer).max(settings.min_sleep_secs);
    Duration::from_secs(secs)
}

/// Sleep between cycles: the rest of the day divided by the remaining
/// quota, shifted by up to ±jitter, never below the minimum sleep.
pub fn cycle_sleep(
    now: DateTime<Utc>,
    remaining: u32,
    settings: &BotSettings,
    rng: &mut impl Rng,
) -> Duration {
    let base = if remaining > 0 {
        seconds_until_midnight(now) / remaining as u64
    } else if settings.daily_limit > 0 {
        SECS_PER_DAY / settings.daily_limit as u64
    } else {
        SECS_PER_DAY
    };

    let jitter = settings.jitter_secs as i64;
    let offset = if jitter > 0 { rng.random_range(-jitter..=jitter) } else { 0 };
    let secs = (base as i64 + offset).max(0) as u64;
    Duration::from_secs(secs.max(settings.min_sleep_secs))
}

/// Drives one bot: cycle, sleep, repeat until shutdown.
pub struct CycleScheduler {
    bot: CorrectionBot,
    rng: StdRng,
}

impl CycleScheduler {
    pub fn new(bot: CorrectionBot) -> Self {
        Self {
            bot,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic jitter, for tests.
    pub fn with_seed(bot: CorrectionBot, seed: u64) -> Self {
        Self {
            bot,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bot(&self) -> &CorrectionBot {
        &self.bot
    }

    /// Sleep to take after a cycle ending at `now`.
    pub fn plan(&mut self, now: DateTime<Utc>) -> SleepPlan {
        let today = now.date_naive();
        if self.bot.store_mut().is_quota_reached(today) {
            SleepPlan::UntilReset(quota_sleep(now, self.bot.settings(), &mut self.rng))
        } else {
            let remaining = self.bot.store_mut().remaining_quota(today);
            SleepPlan::Interval(cycle_sleep(now, remaining, self.bot.settings(), &mut self.rng))
        }
    }

    /// One cycle followed by its sleep plan. A panic inside the cycle is
    /// logged and counts as a cycle with no correction.
    pub async fn tick(&mut self) -> (CycleStats, SleepPlan) {
        let cycle = AssertUnwindSafe(self.bot.run_cycle(Utc::now())).catch_unwind();
        let stats = match cycle.await {
            Ok(stats) => stats,
            Err(payload) => {
                error!(
                    profile = %self.bot.profile(),
                    fault = panic_message(payload.as_ref()),
                    "Cycle panicked, continuing with the normal sleep"
                );
                CycleStats::default()
            }
        };
        let plan = self.plan(Utc::now());
        (stats, plan)
    }

    /// Run cycles until `shutdown` resolves. A cycle in progress always
    /// finishes; shutdown interrupts only the sleep.
    pub async fn run<F>(mut self, shutdown: F) -> CorrectionBot
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let (_, plan) = self.tick().await;
            let wait = plan.duration();
            info!(
                profile = %self.bot.profile(),
                sleep_secs = wait.as_secs(),
                plan = ?plan,
                "Sleeping until next cycle"
            );
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => {
                    info!(profile = %self.bot.profile(), "Shutdown requested");
                    break;
                }
            }
        }
        self.bot
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, h, m, s).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn seconds_until_midnight_counts_down() {
        assert_eq!(seconds_until_midnight(at(0, 0, 0)), SECS_PER_DAY);
        assert_eq!(seconds_until_midnight(at(23, 59, 0)), 60);
        assert_eq!(seconds_until_midnight(at(12, 0, 0)), 43_200);
    }

    #[test]
    fn quota_sleep_lands_after_midnight_within_buffer() {
        let settings = BotSettings::default();
        let now = at(20, 0, 0);
        for _ in 0..50 {
            let secs = quota_sleep(now, &settings, &mut rng()).as_secs();
            assert!((4 * 3600 + 60..=4 * 3600 + 300).contains(&secs), "{secs}");
        }
    }

    #[test]
    fn quota_sleep_respects_minimum() {
        let settings = BotSettings::builder()
            .min_sleep_secs(1_000)
            .quota_buffer_secs((1, 1))
            .build();
        let secs = quota_sleep(at(23, 59, 59), &settings, &mut rng()).as_secs();
        assert_eq!(secs, 1_000);
    }

    #[test]
    fn cycle_sleep_spreads_remaining_quota() {
        let settings = BotSettings::builder().jitter_secs(0).build();
        // 12h left, 4 corrections left: 3h apart.
        let d = cycle_sleep(at(12, 0, 0), 4, &settings, &mut rng());
        assert_eq!(d.as_secs(), 3 * 3600);
    }

    #[test]
    fn cycle_sleep_jitter_is_bounded() {
        let settings = BotSettings::builder().jitter_secs(300).build();
        let mut rng = rng();
        for _ in 0..100 {
            let secs = cycle_sleep(at(12, 0, 0), 4, &settings, &mut rng).as_secs();
            assert!((3 * 3600 - 300..=3 * 3600 + 300).contains(&secs), "{secs}");
        }
    }

    #[test]
    fn cycle_sleep_never_below_minimum() {
        let settings = BotSettings::builder().jitter_secs(300).min_sleep_secs(60).build();
        let mut rng = rng();
        for _ in 0..100 {
            // 60s left over 10 remaining: base 6s.
            let secs = cycle_sleep(at(23, 59, 0), 10, &settings, &mut rng).as_secs();
            assert!(secs >= 60);
        }
    }

    #[test]
    fn zero_remaining_falls_back_to_daily_spacing() {
        let settings = BotSettings::builder().jitter_secs(0).daily_limit(4).build();
        assert_eq!(cycle_sleep(at(12, 0, 0), 0, &settings, &mut rng()).as_secs(), 21_600);

        let settings = BotSettings::builder().jitter_secs(0).daily_limit(0).build();
        assert_eq!(cycle_sleep(at(12, 0, 0), 0, &settings, &mut rng()).as_secs(), SECS_PER_DAY);
    }
}
