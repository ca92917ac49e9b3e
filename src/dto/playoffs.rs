//! DTOs for the playoffs fantasy mode: players, rosters and bulk imports.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::FantasyPlayerEntity,
    dto::validation::validate_team_name,
    state::{
        roster::{Position, PositionSlot},
        scoring::StatLine,
    },
};

/// Column used to order the player list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSortKey {
    /// Fantasy points, the default.
    #[default]
    TotPts,
    /// Player name.
    Name,
    /// Position label.
    Position,
    /// NFL team abbreviation.
    NflTeam,
}

/// Direction applied to [`PlayerSortKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first, the default.
    #[default]
    Desc,
}

/// Filters and ordering for the player list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FantasyPlayerQuery {
    /// Keep only this position.
    pub position: Option<Position>,
    /// Keep only this NFL team.
    pub team: Option<String>,
    /// Column to order by.
    pub sort_by: Option<PlayerSortKey>,
    /// Order direction.
    pub sort_order: Option<SortOrder>,
}

/// Playoff player as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FantasyPlayerSummary {
    /// Player id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Position.
    pub position: Position,
    /// NFL team abbreviation.
    pub nfl_team: String,
    /// Team knocked out of the playoffs.
    pub eliminated: bool,
    /// Cumulative box-score line, flattened.
    #[serde(flatten)]
    pub stats: StatLine,
    /// Fantasy points under the configured rules.
    pub tot_pts: f64,
}

impl From<FantasyPlayerEntity> for FantasyPlayerSummary {
    fn from(player: FantasyPlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            position: player.position,
            nfl_team: player.nfl_team,
            eliminated: player.eliminated,
            stats: player.stats,
            tot_pts: player.tot_pts,
        }
    }
}

/// New playoff player.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFantasyPlayerRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Position.
    pub position: Position,
    /// NFL team abbreviation.
    #[validate(length(min = 2, max = 4))]
    pub nfl_team: String,
    /// Defaults to false.
    #[serde(default)]
    pub eliminated: bool,
    /// Starting box-score line.
    #[serde(flatten)]
    pub stats: StatLine,
}

/// Partial player update; `stats` replaces the whole box-score line.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFantasyPlayerRequest {
    /// New display name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// New position.
    pub position: Option<Position>,
    /// New NFL team.
    #[validate(length(min = 2, max = 4))]
    pub nfl_team: Option<String>,
    /// New elimination flag.
    pub eliminated: Option<bool>,
    /// Replacement box-score line.
    pub stats: Option<StatLine>,
}

/// Spreadsheet rows keyed by column header.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkPlayersRequest {
    /// One map per spreadsheet row.
    #[schema(value_type = Vec<Object>)]
    pub players: Vec<IndexMap<String, serde_json::Value>>,
}

/// Outcome of a bulk import.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BulkImportReport {
    /// Rows written.
    pub inserted: usize,
    /// One message per rejected row.
    pub errors: Vec<String>,
}

/// Player placed in a roster slot.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct RosterSlotInput {
    /// Target slot.
    pub slot: PositionSlot,
    /// Player filling it.
    pub player_id: Uuid,
}

/// New playoff roster.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFantasyTeamRequest {
    /// Unique team name.
    #[validate(custom(function = "validate_team_name"))]
    pub team_name: String,
    /// All 17 slots.
    pub players: Vec<RosterSlotInput>,
}

/// Partial roster update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFantasyTeamRequest {
    /// New team name.
    #[validate(custom(function = "validate_team_name"))]
    pub team_name: Option<String>,
    /// Replacement roster, all 17 slots.
    pub players: Option<Vec<RosterSlotInput>>,
}

/// Filters for the team list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FantasyTeamQuery {
    /// Keep only this owner's teams.
    pub user_id: Option<Uuid>,
    /// Expand rosters and points.
    #[serde(default)]
    pub include_players: bool,
}

/// Player in a roster slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosteredPlayer {
    /// Slot.
    pub slot: PositionSlot,
    /// Player in it.
    pub player: FantasyPlayerSummary,
}

/// Playoff roster as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct FantasyTeamSummary {
    /// Team id.
    pub id: Uuid,
    /// Owner, `None` for imported teams.
    pub user_id: Option<Uuid>,
    /// Team name.
    pub team_name: String,
    /// Roster edits are closed.
    pub is_locked: bool,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Roster, present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<RosteredPlayer>>,
    /// Sum of roster points, present with the roster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_points: Option<f64>,
    /// Leaderboard rank, present with the roster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

/// A team whose 17 player names are listed in slot order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkTeamRow {
    /// Team name.
    pub team_name: String,
    /// Player names.
    pub players: Vec<String>,
}

/// Teams to import.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkTeamsRequest {
    /// One row per team.
    pub teams: Vec<BulkTeamRow>,
}
