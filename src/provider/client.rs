use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    error::{ProviderError, ProviderResult},
    models::{
        GameStatistics, RawRosterResponse, RawScheduleResponse, RawStatisticsResponse,
        TeamRoster, WeekSchedule,
    },
    queue::RequestQueue,
};

const DEFAULT_BASE_URL: &str = "https://api.sportradar.com/nfl/official/trial/v7/en";
const DEFAULT_SEASON_TYPE: &str = "REG";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Environment variable holding the Sportradar API key.
pub const API_KEY_ENV: &str = "SPORTRADAR_API_KEY";

/// Source of NFL schedules, box scores and rosters.
pub trait StatsProvider: Send + Sync {
    /// Games of one regular-season week.
    fn weekly_schedule(&self, season: u16, week: u8)
    -> BoxFuture<'static, ProviderResult<WeekSchedule>>;
    /// Box score of one game, flattened to rushing lines.
    fn game_statistics(&self, game_id: &str) -> BoxFuture<'static, ProviderResult<GameStatistics>>;
    /// Current roster of a team, addressed by provider team id.
    fn team_roster(&self, team_id: &str) -> BoxFuture<'static, ProviderResult<TeamRoster>>;
}

/// Connection settings for the Sportradar feed.
#[derive(Debug, Clone)]
pub struct SportradarConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Key sent as the `api_key` query parameter.
    pub api_key: String,
    /// `PRE`, `REG` or `PST`.
    pub season_type: String,
}

impl SportradarConfig {
    /// Trial endpoint, regular season.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            season_type: DEFAULT_SEASON_TYPE.to_string(),
        }
    }

    /// Point at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey {
                var: API_KEY_ENV,
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("SPORTRADAR_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(season_type) = std::env::var("SPORTRADAR_SEASON_TYPE") {
            config.season_type = season_type;
        }
        Ok(config)
    }
}

/// HTTP client for Sportradar; every call is paced by the shared [`RequestQueue`].
#[derive(Clone)]
pub struct SportradarClient {
    http: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
    season_type: Arc<str>,
    queue: RequestQueue,
}

impl SportradarClient {
    /// Build the HTTP client; requests are paced by `queue`.
    pub fn new(config: SportradarConfig, queue: RequestQueue) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ProviderError::ClientBuilder { source })?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            api_key: Arc::from(config.api_key),
            season_type: Arc::from(config.season_type),
            queue,
        })
    }

    async fn get_json<T>(&self, endpoint: String) -> ProviderResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let http = self.http.clone();
        let url = format!("{}/{}", self.base_url, endpoint);
        let api_key = self.api_key.clone();

        self.queue
            .submit(move || async move {
                debug!(endpoint = %endpoint, "requesting statistics provider");
                let response = http
                    .get(&url)
                    .query(&[("api_key", api_key.as_ref())])
                    .send()
                    .await
                    .map_err(|source| ProviderError::Request {
                        endpoint: endpoint.clone(),
                        source,
                    })?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.trim().parse::<u64>().ok())
                        .map(Duration::from_secs);
                    return Err(ProviderError::RateLimited {
                        endpoint,
                        retry_after,
                    });
                }

                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Status {
                        endpoint,
                        status,
                        message,
                    });
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|source| ProviderError::Decode { endpoint, source })
            })
            .await
    }
}

impl StatsProvider for SportradarClient {
    fn weekly_schedule(
        &self,
        season: u16,
        week: u8,
    ) -> BoxFuture<'static, ProviderResult<WeekSchedule>> {
        let client = self.clone();
        Box::pin(async move {
            let endpoint = format!(
                "games/{season}/{}/{week}/schedule.json",
                client.season_type
            );
            let raw: RawScheduleResponse = client.get_json(endpoint.clone()).await?;
            raw.into_schedule(&endpoint, season, week)
        })
    }

    fn game_statistics(&self, game_id: &str) -> BoxFuture<'static, ProviderResult<GameStatistics>> {
        let client = self.clone();
        let game_id = game_id.to_string();
        Box::pin(async move {
            let endpoint = format!("games/{game_id}/statistics.json");
            let raw: RawStatisticsResponse = client.get_json(endpoint.clone()).await?;
            raw.into_statistics(&endpoint, &game_id)
        })
    }

    fn team_roster(&self, team_id: &str) -> BoxFuture<'static, ProviderResult<TeamRoster>> {
        let client = self.clone();
        let team_id = team_id.to_string();
        Box::pin(async move {
            let endpoint = format!("teams/{team_id}/full_roster.json");
            let raw: RawRosterResponse = client.get_json(endpoint.clone()).await?;
            raw.into_roster(&endpoint)
        })
    }
}

/// Provider used when no API key is configured; every call fails with
/// [`ProviderError::MissingApiKey`] so the rest of the service keeps running.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredProvider {
    var: &'static str,
}

impl UnconfiguredProvider {
    /// `var` names the missing environment variable in errors.
    pub fn new(var: &'static str) -> Self {
        Self { var }
    }

    fn missing<T: Send + 'static>(&self) -> BoxFuture<'static, ProviderResult<T>> {
        let var = self.var;
        Box::pin(async move { Err(ProviderError::MissingApiKey { var }) })
    }
}

impl StatsProvider for UnconfiguredProvider {
    fn weekly_schedule(
        &self,
        _season: u16,
        _week: u8,
    ) -> BoxFuture<'static, ProviderResult<WeekSchedule>> {
        self.missing()
    }

    fn game_statistics(
        &self,
        _game_id: &str,
    ) -> BoxFuture<'static, ProviderResult<GameStatistics>> {
        self.missing()
    }

    fn team_roster(&self, _team_id: &str) -> BoxFuture<'static, ProviderResult<TeamRoster>> {
        self.missing()
    }
}
