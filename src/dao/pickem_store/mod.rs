/// In-process store used by tests and local runs.
pub mod memory;
/// PostgREST-backed store.
#[cfg(feature = "postgrest-store")]
pub mod postgrest;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            FantasyPlayerEntity, FantasyTeamEntity, GameEntity, PickEntity, PickFilter,
            ProfileEntity, RunningBackEntity, SettlementReport, WeekSettlement,
        },
        storage::StorageResult,
    },
    state::week::{WeekKey, WeekStatus},
};

/// Abstraction over the persistence layer for the pick'em and playoffs data.
pub trait PickemStore: Send + Sync {
    /// Profile by user id.
    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>>;
    /// Every profile.
    fn list_profiles(&self) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>>;
    /// Upsert a profile.
    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically add `delta` to a profile's total and return the new total.
    fn increment_total_yards(
        &self,
        user_id: Uuid,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<i64>>;

    /// Picks matching the filter.
    fn list_picks(&self, filter: PickFilter) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>>;
    /// Insert a pick; fails with a conflict when the user already picked that week.
    fn insert_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite an existing pick.
    fn update_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a user's picks, optionally narrowed to a season and week, returning them.
    fn delete_picks(
        &self,
        user_id: Uuid,
        season: Option<u16>,
        week: Option<u8>,
    ) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>>;

    /// Running backs of a week.
    fn list_running_backs(
        &self,
        key: WeekKey,
    ) -> BoxFuture<'static, StorageResult<Vec<RunningBackEntity>>>;
    /// One running back of a week.
    fn find_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>>;
    /// Upsert a running back by week and player id.
    fn save_running_back(&self, running_back: RunningBackEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a running back from a week, returning the removed row.
    fn delete_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>>;
    /// Persist only the lock flag of a running back.
    fn set_player_lock(
        &self,
        key: WeekKey,
        player_id: &str,
        locked: bool,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Games of a week.
    fn list_games(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Upsert a game.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Finalization state of a week; unknown weeks are active.
    fn week_status(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<WeekStatus>>;
    /// Write settled yards, profile totals and the finalized flag as one unit.
    ///
    /// Fails with a conflict when the week is already finalized, leaving
    /// every record untouched.
    fn settle_week(
        &self,
        settlement: WeekSettlement,
    ) -> BoxFuture<'static, StorageResult<SettlementReport>>;

    /// Every playoff player.
    fn list_fantasy_players(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyPlayerEntity>>>;
    /// Playoff player by id.
    fn find_fantasy_player(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyPlayerEntity>>>;
    /// Upsert a playoff player.
    fn save_fantasy_player(&self, player: FantasyPlayerEntity)
    -> BoxFuture<'static, StorageResult<()>>;

    /// Every playoff team.
    fn list_fantasy_teams(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyTeamEntity>>>;
    /// Playoff team by id.
    fn find_fantasy_team(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyTeamEntity>>>;
    /// Upsert a team; fails with a conflict when another team has the same name.
    fn save_fantasy_team(&self, team: FantasyTeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a team, returning whether it existed.
    fn delete_fantasy_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failure.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
