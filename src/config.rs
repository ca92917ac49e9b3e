//! Application-level configuration loading: provider pacing, lock timing,
//! leaderboard goal and playoff scoring.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use time::{OffsetDateTime, macros::datetime};
use tracing::{info, warn};

use crate::{
    provider::RateLimitConfig,
    state::{lock::LockPolicy, scoring::ScoringRules},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PICKEM_BACK_CONFIG_PATH";

const DEFAULT_GOAL_YARDS: i64 = 2_000;
const DEFAULT_TEAM_LOCK_AT: OffsetDateTime = datetime!(2026-01-10 18:00 UTC);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Caps on outbound provider calls.
    pub rate_limit: RateLimitConfig,
    /// Lead time before kickoff at which players lock.
    pub lock_policy: LockPolicy,
    /// Period of the background lock sweep.
    pub lock_sweep_interval: Duration,
    /// Trailing-minute request count at which bulk refreshes ask callers to wait.
    pub throttle_threshold: usize,
    /// Wait suggested to throttled callers.
    pub throttle_retry_after: Duration,
    /// Season yardage goal shown on the leaderboard.
    pub goal_yards: i64,
    /// Instant after which playoff rosters can no longer be edited.
    pub team_lock_at: OffsetDateTime,
    /// Point values for playoff fantasy scoring.
    pub scoring: ScoringRules,
    /// Rows written per batch by bulk imports.
    pub import_batch_size: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        minute_cap = app_config.rate_limit.max_requests_per_minute,
                        hour_cap = app_config.rate_limit.max_requests_per_hour,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            lock_policy: LockPolicy::default(),
            lock_sweep_interval: Duration::from_secs(60),
            throttle_threshold: 8,
            throttle_retry_after: Duration::from_secs(60),
            goal_yards: DEFAULT_GOAL_YARDS,
            team_lock_at: DEFAULT_TEAM_LOCK_AT,
            scoring: ScoringRules::default(),
            import_batch_size: 50,
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rate_limit: RawRateLimit,
    lock_lead_minutes: Option<i64>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    lock_sweep_interval_secs: Option<Duration>,
    throttle_threshold: Option<usize>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    throttle_retry_after_secs: Option<Duration>,
    goal_yards: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    team_lock_at: Option<OffsetDateTime>,
    scoring: RawScoring,
    import_batch_size: Option<usize>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRateLimit {
    max_requests_per_minute: Option<usize>,
    max_requests_per_hour: Option<usize>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    base_delay_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    max_delay_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    dispatch_spacing_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    max_jitter_ms: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScoring {
    passing_yards_per_point: Option<f64>,
    passing_td: Option<f64>,
    interception: Option<f64>,
    rushing_yards_per_point: Option<f64>,
    rushing_td: Option<f64>,
    reception: Option<f64>,
    receiving_yards_per_point: Option<f64>,
    receiving_td: Option<f64>,
    fumble: Option<f64>,
    kicking_point: Option<f64>,
}

impl From<RawRateLimit> for RateLimitConfig {
    fn from(raw: RawRateLimit) -> Self {
        let base = RateLimitConfig::default();
        Self {
            max_requests_per_minute: raw
                .max_requests_per_minute
                .unwrap_or(base.max_requests_per_minute),
            max_requests_per_hour: raw
                .max_requests_per_hour
                .unwrap_or(base.max_requests_per_hour),
            base_delay: raw.base_delay_ms.unwrap_or(base.base_delay),
            max_delay: raw.max_delay_ms.unwrap_or(base.max_delay),
            dispatch_spacing: raw.dispatch_spacing_ms.unwrap_or(base.dispatch_spacing),
            max_jitter: raw.max_jitter_ms.unwrap_or(base.max_jitter),
        }
    }
}

impl From<RawScoring> for ScoringRules {
    fn from(raw: RawScoring) -> Self {
        let base = ScoringRules::default();
        Self {
            passing_yards_per_point: raw
                .passing_yards_per_point
                .unwrap_or(base.passing_yards_per_point),
            passing_td: raw.passing_td.unwrap_or(base.passing_td),
            interception: raw.interception.unwrap_or(base.interception),
            rushing_yards_per_point: raw
                .rushing_yards_per_point
                .unwrap_or(base.rushing_yards_per_point),
            rushing_td: raw.rushing_td.unwrap_or(base.rushing_td),
            reception: raw.reception.unwrap_or(base.reception),
            receiving_yards_per_point: raw
                .receiving_yards_per_point
                .unwrap_or(base.receiving_yards_per_point),
            receiving_td: raw.receiving_td.unwrap_or(base.receiving_td),
            fumble: raw.fumble.unwrap_or(base.fumble),
            kicking_point: raw.kicking_point.unwrap_or(base.kicking_point),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let base = AppConfig::default();
        Self {
            rate_limit: raw.rate_limit.into(),
            lock_policy: raw
                .lock_lead_minutes
                .map_or(base.lock_policy, |minutes| {
                    LockPolicy::new(time::Duration::minutes(minutes))
                }),
            lock_sweep_interval: raw
                .lock_sweep_interval_secs
                .unwrap_or(base.lock_sweep_interval),
            throttle_threshold: raw.throttle_threshold.unwrap_or(base.throttle_threshold),
            throttle_retry_after: raw
                .throttle_retry_after_secs
                .unwrap_or(base.throttle_retry_after),
            goal_yards: raw.goal_yards.unwrap_or(base.goal_yards),
            team_lock_at: raw.team_lock_at.unwrap_or(base.team_lock_at),
            scoring: raw.scoring.into(),
            import_batch_size: raw
                .import_batch_size
                .filter(|size| *size > 0)
                .unwrap_or(base.import_batch_size),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
