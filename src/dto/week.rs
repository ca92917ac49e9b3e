use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::state::week::{WeekKey, WeekStatus};

/// Body naming one NFL week.
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeekRequest {
    /// Season year.
    #[validate(range(min = 2000))]
    pub season: u16,
    /// Week number, 1 to 18.
    #[validate(range(min = 1, max = 18))]
    pub week: u8,
}

impl From<WeekRequest> for WeekKey {
    fn from(request: WeekRequest) -> Self {
        WeekKey::new(request.season, request.week)
    }
}

/// Finalization state of a week.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekStatusResponse {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Current state.
    #[serde(flatten)]
    pub status: WeekStatus,
}

/// Totals reported by a lock sweep.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LockRefreshResponse {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Running backs evaluated.
    pub checked: usize,
    /// Players whose lock flipped during this sweep.
    pub newly_locked: Vec<String>,
    /// Players that were locked before the sweep.
    pub already_locked: usize,
    /// Persistence failures skipped during the sweep.
    pub failures: usize,
    /// Picks whose display status advanced.
    pub picks_updated: usize,
}

/// Outcome of settling a week.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalizeWeekResponse {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Settlement time.
    #[serde(with = "time::serde::rfc3339")]
    pub finalized_at: OffsetDateTime,
    /// Picks frozen.
    pub picks_settled: usize,
    /// Profiles whose total moved.
    pub profiles_updated: usize,
    /// Picks whose yards came from a fresh provider read rather than the stored value.
    pub yards_refreshed: usize,
}
