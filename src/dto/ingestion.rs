//! DTOs for yard ingestion, schedule sync and the automated-update helpers.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::RunningBackEntity,
    provider::{
        QueueStatus,
        models::{GameStatus, RushingLine},
    },
};

/// Yard refresh for one player, or the whole week when `player_id` is absent.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateYardsRequest {
    /// Season year.
    #[validate(range(min = 2000))]
    pub season: u16,
    /// Week number.
    #[validate(range(min = 1, max = 18))]
    pub week: u8,
    /// Single player to refresh.
    #[validate(length(min = 1, max = 64))]
    pub player_id: Option<String>,
}

/// Yards written for one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerYardsResult {
    /// Provider player id.
    pub player_id: String,
    /// Yards now stored.
    pub yards: i64,
    /// Open picks moved to the new yards.
    pub picks_updated: usize,
}

/// Summary of a yard refresh run.
#[derive(Debug, Serialize, ToSchema)]
pub struct YardsUpdateReport {
    /// Players whose yards were written.
    pub updated_players: usize,
    /// Players skipped after a provider or storage error.
    pub errors: usize,
    /// The run stopped before every player was refreshed to stay under the provider cap.
    pub stopped_early: bool,
    /// Per-player outcome.
    pub results: Vec<PlayerYardsResult>,
    /// Provider queue after the run.
    pub provider_queue: QueueStatus,
}

/// Outcome of a schedule sync.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleSyncResponse {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Games written.
    pub games_saved: usize,
    /// Running backs given their game and kickoff.
    pub running_backs_stamped: usize,
}

/// State read by the automated-update poller.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutomatedStatusResponse {
    /// A game of the current week is in progress.
    pub has_live_games: bool,
    /// Next scheduled kickoff, if any.
    #[serde(with = "time::serde::rfc3339::option")]
    pub next_game_time: Option<OffsetDateTime>,
    /// Time of this answer.
    #[serde(with = "time::serde::rfc3339")]
    pub last_update: OffsetDateTime,
}

/// Running back search within a week.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RunningBackQuery {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Case-insensitive match on name or team.
    pub q: Option<String>,
}

/// Running back as listed to players.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunningBackSummary {
    /// Provider player id.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Team abbreviation.
    pub team: String,
    /// Opponent abbreviation, once the schedule is known.
    pub opponent: Option<String>,
    /// Rushing yards this week.
    pub yards: i64,
    /// Kickoff of the player's game.
    #[serde(with = "time::serde::rfc3339::option")]
    pub kickoff: Option<OffsetDateTime>,
    /// Picks on this player are closed.
    pub is_locked: bool,
}

impl From<RunningBackEntity> for RunningBackSummary {
    fn from(rb: RunningBackEntity) -> Self {
        Self {
            player_id: rb.player_id,
            name: rb.name,
            team: rb.team,
            opponent: rb.opponent,
            yards: rb.yards,
            kickoff: rb.kickoff,
            is_locked: rb.is_locked,
        }
    }
}

/// Running backs of a week.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunningBackList {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Length of `running_backs`.
    pub total: usize,
    /// Matching rows.
    pub running_backs: Vec<RunningBackSummary>,
}

/// Rushing lines of one started game.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveGameRushing {
    /// Provider game id.
    pub game_id: String,
    /// Game state.
    pub status: GameStatus,
    /// Home team.
    pub home: String,
    /// Away team.
    pub away: String,
    /// Rushing lines, both teams.
    pub rushers: Vec<RushingLine>,
}

/// Rushing in the started games of a week.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveRushersResponse {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Games with a box score.
    pub games: Vec<LiveGameRushing>,
    /// Games whose box score could not be fetched.
    pub unavailable: Vec<String>,
}
