use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    dao::models::WeekSettlement,
    state::week::{WeekKey, WeekStatus},
};

pub const PROFILES: &str = "profiles";
pub const PICKS: &str = "weekly_picks";
pub const RUNNING_BACKS: &str = "running_backs";
pub const GAMES: &str = "games";
pub const WEEKS: &str = "week_status";
pub const FANTASY_PLAYERS: &str = "playoffs_players";
pub const FANTASY_TEAMS: &str = "playoffs_teams";

/// Row of the `week_status` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekRow {
    pub season: u16,
    pub week: u8,
    pub is_finalized: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub finalized_at: Option<OffsetDateTime>,
}

impl WeekRow {
    pub fn status(&self, key: WeekKey) -> WeekStatus {
        match (self.is_finalized, self.finalized_at) {
            (true, Some(at)) => WeekStatus::Finalized { at },
            (true, None) => {
                tracing::warn!(%key, "finalized week without timestamp");
                WeekStatus::Finalized {
                    at: OffsetDateTime::UNIX_EPOCH,
                }
            }
            (false, _) => WeekStatus::Active,
        }
    }
}

/// Arguments of the `increment_total_yards` function.
#[derive(Debug, Serialize)]
pub struct IncrementArgs {
    pub user_id: uuid::Uuid,
    pub delta: i64,
}

/// Arguments of the `settle_week` function, which runs in one transaction.
#[derive(Debug, Serialize)]
pub struct SettleArgs<'a> {
    pub settlement: &'a WeekSettlement,
}

/// Equality filter value in PostgREST syntax.
pub fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}
