use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    provider::models::GameStatus,
    state::{
        roster::{Position, PositionSlot},
        scoring::StatLine,
        week::WeekKey,
    },
};

/// Pick'em participant profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntity {
    /// Auth user id.
    pub id: Uuid,
    /// Contact email.
    pub email: String,
    /// Display name on the leaderboard.
    pub team_name: String,
    /// Base64 data URL of the uploaded logo.
    pub team_logo_data: Option<String>,
    /// Sum of `yards_gained` over the user's picks.
    pub total_yards: i64,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Display state of a pick, derived from the lock sweep and finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PickGameStatus {
    /// Game not started.
    Pending,
    /// Player locked, yards may still move.
    Locked,
    /// Week settled.
    Final,
}

impl PickGameStatus {
    /// Never moves backwards.
    pub fn advance(self, next: PickGameStatus) -> PickGameStatus {
        self.max(next)
    }
}

/// One user's running back selection for one week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickEntity {
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
    /// Name copied at pick time.
    pub player_name: String,
    /// Yards credited so far.
    pub yards_gained: i64,
    /// Frozen by settlement.
    pub is_finalized: bool,
    /// Display state.
    pub game_status: PickGameStatus,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PickEntity {
    /// Week the pick belongs to.
    pub fn key(&self) -> WeekKey {
        WeekKey::new(self.season, self.week)
    }
}

/// Running back available for a given week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningBackEntity {
    /// Row id.
    pub id: Uuid,
    /// Provider player identifier.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Team abbreviation.
    pub team: String,
    /// Opponent abbreviation.
    pub opponent: Option<String>,
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Rushing yards this week.
    pub yards: i64,
    /// Games counted in `yards`.
    pub games_played: i32,
    /// Provider game id.
    pub game_id: Option<String>,
    /// Kickoff of that game.
    #[serde(with = "time::serde::rfc3339::option")]
    pub kickoff: Option<OffsetDateTime>,
    /// Picks closed. Never cleared once set.
    pub is_locked: bool,
    /// Row typed in by an operator rather than cached from the provider.
    #[serde(rename = "is_manual_entry", default)]
    pub manual_entry: bool,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl RunningBackEntity {
    /// Week the row belongs to.
    pub fn key(&self) -> WeekKey {
        WeekKey::new(self.season, self.week)
    }
}

/// NFL game known for a week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEntity {
    /// Provider game id.
    pub game_id: String,
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Home alias.
    pub home_team: String,
    /// Away alias.
    pub away_team: String,
    /// Scheduled kickoff.
    #[serde(with = "time::serde::rfc3339::option")]
    pub kickoff: Option<OffsetDateTime>,
    /// Provider game state.
    pub status: GameStatus,
    /// Current quarter while live.
    pub quarter: Option<u8>,
    /// Game clock while live.
    pub clock: Option<String>,
    /// Last sync.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Filter applied when listing picks. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickFilter {
    /// Owner.
    pub user_id: Option<Uuid>,
    /// Season year.
    pub season: Option<u16>,
    /// Week number.
    pub week: Option<u8>,
    /// Picked player.
    pub player_id: Option<String>,
    /// Settlement flag.
    pub is_finalized: Option<bool>,
}

impl PickFilter {
    /// Every pick of one week.
    pub fn for_week(key: WeekKey) -> Self {
        Self {
            season: Some(key.season),
            week: Some(key.week),
            ..Self::default()
        }
    }

    /// Whether `pick` passes every set field.
    pub fn matches(&self, pick: &PickEntity) -> bool {
        self.user_id.is_none_or(|id| pick.user_id == id)
            && self.season.is_none_or(|s| pick.season == s)
            && self.week.is_none_or(|w| pick.week == w)
            && self
                .player_id
                .as_deref()
                .is_none_or(|p| pick.player_id == p)
            && self.is_finalized.is_none_or(|f| pick.is_finalized == f)
    }
}

/// Final yardage for one pick at week settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettledPick {
    /// Pick settled.
    pub pick_id: Uuid,
    /// Final yards.
    pub yards: i64,
}

/// Everything written when a week is finalized, applied as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSettlement {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Settlement time.
    #[serde(with = "time::serde::rfc3339")]
    pub finalized_at: OffsetDateTime,
    /// Final yards of every pick of the week.
    pub picks: Vec<SettledPick>,
}

impl WeekSettlement {
    /// Week being settled.
    pub fn key(&self) -> WeekKey {
        WeekKey::new(self.season, self.week)
    }
}

/// Counts returned by a successful settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SettlementReport {
    /// Picks frozen.
    pub picks_settled: usize,
    /// Profiles whose total moved.
    pub profiles_updated: usize,
}

/// Playoff player with their cumulative box-score line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FantasyPlayerEntity {
    /// Player id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Position.
    pub position: Position,
    /// NFL team abbreviation.
    pub nfl_team: String,
    /// Team knocked out.
    pub eliminated: bool,
    /// Cumulative box score.
    #[serde(flatten)]
    pub stats: StatLine,
    /// Points derived from `stats` when the player was last saved.
    pub tot_pts: f64,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Player stored in one roster slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterSlotEntity {
    /// Slot.
    pub slot: PositionSlot,
    /// Player in it.
    pub player_id: Uuid,
}

/// Drafted playoff roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FantasyTeamEntity {
    /// Team id.
    pub id: Uuid,
    /// Owner, `None` for imported teams.
    pub user_id: Option<Uuid>,
    /// Unique team name.
    pub team_name: String,
    /// Roster edits closed.
    pub is_locked: bool,
    /// All 17 slots.
    pub roster: Vec<RosterSlotEntity>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
