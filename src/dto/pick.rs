//! DTOs for the weekly pick endpoints.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{PickEntity, PickGameStatus};

/// Request to pick a running back for a week.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePickRequest {
    /// Season year.
    #[validate(range(min = 2000))]
    pub season: u16,
    /// Week number.
    #[validate(range(min = 1, max = 18))]
    pub week: u8,
    /// Running back to pick.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
}

/// Optional season/week narrowing for pick listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PickQuery {
    /// Keep only this season.
    pub season: Option<u16>,
    /// Keep only this week.
    pub week: Option<u8>,
}

/// A pick as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PickSummary {
    /// Pick id.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Provider player id.
    pub player_id: String,
    /// Name at the time of the pick.
    pub player_name: String,
    /// Yards credited so far.
    pub yards_gained: i64,
    /// Frozen by week settlement.
    pub is_finalized: bool,
    /// Display state.
    pub game_status: PickGameStatus,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PickEntity> for PickSummary {
    fn from(pick: PickEntity) -> Self {
        Self {
            id: pick.id,
            user_id: pick.user_id,
            season: pick.season,
            week: pick.week,
            player_id: pick.player_id,
            player_name: pick.player_name,
            yards_gained: pick.yards_gained,
            is_finalized: pick.is_finalized,
            game_status: pick.game_status,
            created_at: pick.created_at,
        }
    }
}

/// Outcome of a season reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetSeasonResponse {
    /// Picks removed.
    pub picks_deleted: usize,
    /// Total after the reset, always zero.
    pub total_yards: i64,
}
