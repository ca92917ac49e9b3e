//! DTOs for filling the weekly running back pool, from the provider or by hand.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::provider::QueueStatus;

/// Outcome of caching a week's running backs from team rosters.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunningBackCacheReport {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Rosters read from the provider.
    pub teams_fetched: usize,
    /// Running backs found across those rosters.
    pub total: usize,
    /// Rows created by this run.
    pub cached: usize,
    /// Existing rows refreshed by this run.
    pub updated: usize,
    /// Rosters or rows that failed.
    pub errors: usize,
    /// The provider rate limited the run before every roster was read.
    pub stopped_early: bool,
    /// Provider queue after the run.
    pub provider_queue: QueueStatus,
}

/// Operator-supplied line for one running back.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ManualRunningBack {
    /// Player id, provider or operator made.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Team abbreviation.
    #[validate(length(min = 2, max = 4))]
    pub team: String,
    /// Rushing yards.
    #[validate(range(min = -100, max = 1000))]
    pub yards: i64,
    /// Defaults to 1.
    #[validate(range(min = 0, max = 2))]
    pub games_played: Option<i32>,
    /// Opponent abbreviation.
    #[validate(length(min = 2, max = 4))]
    pub opponent: Option<String>,
    /// Kickoff of the game.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub kickoff: Option<OffsetDateTime>,
    /// Defaults to locked: manual lines usually describe finished games.
    pub is_locked: Option<bool>,
}

/// One or many manual lines for a week.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ManualEntriesRequest {
    /// Season year.
    #[validate(range(min = 2000))]
    pub season: u16,
    /// Week number.
    #[validate(range(min = 1, max = 18))]
    pub week: u8,
    /// Lines to upsert.
    #[validate(length(min = 1, max = 200), nested)]
    pub players: Vec<ManualRunningBack>,
}

/// Outcome of a manual upsert.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ManualEntriesReport {
    /// New rows.
    pub created: usize,
    /// Rows overwritten.
    pub updated: usize,
    /// Open picks whose yards moved with the manual line.
    pub picks_updated: usize,
}

/// Address of one manual entry.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ManualEntryKey {
    /// Season year.
    #[validate(range(min = 2000))]
    pub season: u16,
    /// Week number.
    #[validate(range(min = 1, max = 18))]
    pub week: u8,
    /// Manual row to delete.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
}
