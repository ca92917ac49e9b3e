//! In-process store backed by concurrent maps. Used when no database is
//! configured and by the service tests.

use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::{DashMap, DashSet, mapref::entry::Entry};
use futures::future::{BoxFuture, ready};
use time::OffsetDateTime;
use uuid::Uuid;

use super::PickemStore;
use crate::{
    dao::{
        models::{
            FantasyPlayerEntity, FantasyTeamEntity, GameEntity, PickEntity, PickFilter,
            PickGameStatus, ProfileEntity, RunningBackEntity, SettlementReport, WeekSettlement,
        },
        storage::{StorageError, StorageResult},
    },
    state::week::{WeekKey, WeekStatus},
};

type PickSlot = (Uuid, u16, u8);

#[derive(Default)]
struct Tables {
    profiles: DashMap<Uuid, ProfileEntity>,
    picks: DashMap<Uuid, PickEntity>,
    pick_slots: DashMap<PickSlot, Uuid>,
    running_backs: DashMap<(WeekKey, String), RunningBackEntity>,
    games: DashMap<(WeekKey, String), GameEntity>,
    weeks: DashMap<WeekKey, WeekStatus>,
    fantasy_players: DashMap<Uuid, FantasyPlayerEntity>,
    fantasy_teams: DashMap<Uuid, FantasyTeamEntity>,
    team_names: Mutex<()>,
    failing_lock_writes: DashSet<String>,
}

/// [`PickemStore`] kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every lock write for `player_id` fail, to exercise partial sweeps.
    #[cfg(test)]
    pub fn fail_lock_writes(&self, player_id: &str) {
        self.tables.failing_lock_writes.insert(player_id.to_string());
    }

    fn insert_pick_now(&self, pick: PickEntity) -> StorageResult<()> {
        let slot = (pick.user_id, pick.season, pick.week);
        match self.tables.pick_slots.entry(slot) {
            Entry::Occupied(_) => Err(StorageError::conflict(format!(
                "pick already exists for user {} in {}",
                pick.user_id,
                pick.key()
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(pick.id);
                self.tables.picks.insert(pick.id, pick);
                Ok(())
            }
        }
    }

    fn settle_now(&self, settlement: WeekSettlement) -> StorageResult<SettlementReport> {
        let key = settlement.key();
        let mut week = self.tables.weeks.entry(key).or_insert(WeekStatus::Active);
        if week.is_finalized() {
            return Err(StorageError::conflict(format!("{key} is already finalized")));
        }

        if let Some(missing) = settlement
            .picks
            .iter()
            .find(|settled| !self.tables.picks.contains_key(&settled.pick_id))
        {
            return Err(StorageError::missing(format!(
                "pick {} does not exist",
                missing.pick_id
            )));
        }

        let settled: HashMap<Uuid, i64> = settlement
            .picks
            .iter()
            .map(|pick| (pick.pick_id, pick.yards))
            .collect();

        let mut deltas: HashMap<Uuid, i64> = HashMap::new();
        let mut picks_settled = 0;
        for mut pick in self.tables.picks.iter_mut() {
            if pick.value().key() != key {
                continue;
            }
            if let Some(yards) = settled.get(&pick.id) {
                *deltas.entry(pick.user_id).or_default() += yards - pick.yards_gained;
                pick.yards_gained = *yards;
                picks_settled += 1;
            }
            pick.is_finalized = true;
            pick.game_status = PickGameStatus::Final;
            pick.updated_at = settlement.finalized_at;
        }

        let mut profiles_updated = 0;
        for (user_id, delta) in deltas {
            if let Some(mut profile) = self.tables.profiles.get_mut(&user_id) {
                profile.total_yards += delta;
                profile.updated_at = settlement.finalized_at;
                profiles_updated += 1;
            }
        }

        *week = WeekStatus::Finalized {
            at: settlement.finalized_at,
        };

        Ok(SettlementReport {
            picks_settled,
            profiles_updated,
        })
    }

    fn save_team_now(&self, team: FantasyTeamEntity) -> StorageResult<()> {
        let _names = self
            .tables
            .team_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let wanted = team.team_name.trim();
        let taken = self.tables.fantasy_teams.iter().any(|existing| {
            existing.id != team.id && existing.team_name.trim().eq_ignore_ascii_case(wanted)
        });
        if taken {
            return Err(StorageError::conflict(format!(
                "team name `{wanted}` is already taken"
            )));
        }

        self.tables.fantasy_teams.insert(team.id, team);
        Ok(())
    }
}

fn done<T: Send + 'static>(value: StorageResult<T>) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(ready(value))
}

impl PickemStore for MemoryStore {
    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        done(Ok(self.tables.profiles.get(&id).map(|p| p.value().clone())))
    }

    fn list_profiles(&self) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>> {
        done(Ok(self
            .tables
            .profiles
            .iter()
            .map(|p| p.value().clone())
            .collect()))
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.tables.profiles.insert(profile.id, profile);
        done(Ok(()))
    }

    fn increment_total_yards(
        &self,
        user_id: Uuid,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let result = match self.tables.profiles.get_mut(&user_id) {
            Some(mut profile) => {
                profile.total_yards += delta;
                profile.updated_at = OffsetDateTime::now_utc();
                Ok(profile.total_yards)
            }
            None => Err(StorageError::missing(format!(
                "profile {user_id} does not exist"
            ))),
        };
        done(result)
    }

    fn list_picks(&self, filter: PickFilter) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>> {
        done(Ok(self
            .tables
            .picks
            .iter()
            .filter(|pick| filter.matches(pick))
            .map(|pick| pick.value().clone())
            .collect()))
    }

    fn insert_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>> {
        done(self.insert_pick_now(pick))
    }

    fn update_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.tables.picks.get_mut(&pick.id) {
            Some(mut existing) => {
                *existing = pick;
                Ok(())
            }
            None => Err(StorageError::missing(format!(
                "pick {} does not exist",
                pick.id
            ))),
        };
        done(result)
    }

    fn delete_picks(
        &self,
        user_id: Uuid,
        season: Option<u16>,
        week: Option<u8>,
    ) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>> {
        let filter = PickFilter {
            user_id: Some(user_id),
            season,
            week,
            ..PickFilter::default()
        };
        let ids: Vec<Uuid> = self
            .tables
            .picks
            .iter()
            .filter(|pick| filter.matches(pick))
            .map(|pick| pick.id)
            .collect();

        let removed = ids
            .into_iter()
            .filter_map(|id| self.tables.picks.remove(&id))
            .map(|(_, pick)| {
                self.tables
                    .pick_slots
                    .remove(&(pick.user_id, pick.season, pick.week));
                pick
            })
            .collect();
        done(Ok(removed))
    }

    fn list_running_backs(
        &self,
        key: WeekKey,
    ) -> BoxFuture<'static, StorageResult<Vec<RunningBackEntity>>> {
        done(Ok(self
            .tables
            .running_backs
            .iter()
            .filter(|rb| rb.key().0 == key)
            .map(|rb| rb.value().clone())
            .collect()))
    }

    fn find_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>> {
        done(Ok(self
            .tables
            .running_backs
            .get(&(key, player_id.to_string()))
            .map(|rb| rb.value().clone())))
    }

    fn save_running_back(
        &self,
        running_back: RunningBackEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let slot = (running_back.key(), running_back.player_id.clone());
        self.tables.running_backs.insert(slot, running_back);
        done(Ok(()))
    }

    fn delete_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>> {
        done(Ok(self
            .tables
            .running_backs
            .remove(&(key, player_id.to_string()))
            .map(|(_, rb)| rb)))
    }

    fn set_player_lock(
        &self,
        key: WeekKey,
        player_id: &str,
        locked: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        if self.tables.failing_lock_writes.contains(player_id) {
            return done(Err(StorageError::unavailable(
                format!("lock write for {player_id} rejected"),
                io::Error::other("write rejected"),
            )));
        }

        let result = match self
            .tables
            .running_backs
            .get_mut(&(key, player_id.to_string()))
        {
            Some(mut rb) => {
                rb.is_locked = locked;
                rb.updated_at = OffsetDateTime::now_utc();
                Ok(())
            }
            None => Err(StorageError::missing(format!(
                "running back {player_id} not found for {key}"
            ))),
        };
        done(result)
    }

    fn list_games(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        done(Ok(self
            .tables
            .games
            .iter()
            .filter(|game| game.key().0 == key)
            .map(|game| game.value().clone())
            .collect()))
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let slot = (WeekKey::new(game.season, game.week), game.game_id.clone());
        self.tables.games.insert(slot, game);
        done(Ok(()))
    }

    fn week_status(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<WeekStatus>> {
        done(Ok(self
            .tables
            .weeks
            .get(&key)
            .map(|status| *status)
            .unwrap_or(WeekStatus::Active)))
    }

    fn settle_week(
        &self,
        settlement: WeekSettlement,
    ) -> BoxFuture<'static, StorageResult<SettlementReport>> {
        done(self.settle_now(settlement))
    }

    fn list_fantasy_players(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyPlayerEntity>>> {
        done(Ok(self
            .tables
            .fantasy_players
            .iter()
            .map(|p| p.value().clone())
            .collect()))
    }

    fn find_fantasy_player(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyPlayerEntity>>> {
        done(Ok(self.tables.fantasy_players.get(&id).map(|p| p.value().clone())))
    }

    fn save_fantasy_player(
        &self,
        player: FantasyPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.tables.fantasy_players.insert(player.id, player);
        done(Ok(()))
    }

    fn list_fantasy_teams(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyTeamEntity>>> {
        done(Ok(self
            .tables
            .fantasy_teams
            .iter()
            .map(|t| t.value().clone())
            .collect()))
    }

    fn find_fantasy_team(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyTeamEntity>>> {
        done(Ok(self.tables.fantasy_teams.get(&id).map(|t| t.value().clone())))
    }

    fn save_fantasy_team(&self, team: FantasyTeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        done(self.save_team_now(team))
    }

    fn delete_fantasy_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        done(Ok(self.tables.fantasy_teams.remove(&id).is_some()))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        done(Ok(()))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        done(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::SettledPick;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-09-10 12:00 UTC);

    fn profile(id: Uuid) -> ProfileEntity {
        ProfileEntity {
            id,
            email: "fan@example.com".into(),
            team_name: "Ground Game".into(),
            team_logo_data: None,
            total_yards: 0,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn pick(user_id: Uuid, week: u8, yards: i64) -> PickEntity {
        PickEntity {
            id: Uuid::new_v4(),
            user_id,
            season: 2024,
            week,
            player_id: "rb-1".into(),
            player_name: "Saquon Barkley".into(),
            yards_gained: yards,
            is_finalized: false,
            game_status: PickGameStatus::Pending,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    #[tokio::test]
    async fn second_pick_for_same_week_conflicts() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.insert_pick(pick(user, 1, 0)).await.unwrap();
        let err = store.insert_pick(pick(user, 1, 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        store.insert_pick(pick(user, 2, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_frees_the_week_slot() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.insert_pick(pick(user, 1, 10)).await.unwrap();
        let removed = store.delete_picks(user, Some(2024), Some(1)).await.unwrap();
        assert_eq!(removed.len(), 1);
        store.insert_pick(pick(user, 1, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn settle_applies_deltas_and_flag_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut owner = profile(user);
        owner.total_yards = 40;
        store.save_profile(owner).await.unwrap();
        let existing = pick(user, 1, 40);
        store.insert_pick(existing.clone()).await.unwrap();

        let settlement = WeekSettlement {
            season: 2024,
            week: 1,
            finalized_at: NOW,
            picks: vec![SettledPick {
                pick_id: existing.id,
                yards: 112,
            }],
        };
        let report = store.settle_week(settlement.clone()).await.unwrap();
        assert_eq!(report.picks_settled, 1);
        assert_eq!(report.profiles_updated, 1);

        let total = store.find_profile(user).await.unwrap().unwrap().total_yards;
        assert_eq!(total, 112);
        let status = store.week_status(WeekKey::new(2024, 1)).await.unwrap();
        assert!(status.is_finalized());

        let err = store.settle_week(settlement).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        let total = store.find_profile(user).await.unwrap().unwrap().total_yards;
        assert_eq!(total, 112);
    }

    #[tokio::test]
    async fn settle_with_unknown_pick_changes_nothing() {
        let store = MemoryStore::new();
        let settlement = WeekSettlement {
            season: 2024,
            week: 1,
            finalized_at: NOW,
            picks: vec![SettledPick {
                pick_id: Uuid::new_v4(),
                yards: 1,
            }],
        };
        assert!(store.settle_week(settlement).await.is_err());
        let status = store.week_status(WeekKey::new(2024, 1)).await.unwrap();
        assert_eq!(status, WeekStatus::Active);
    }

    #[tokio::test]
    async fn team_names_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        let team = |name: &str| FantasyTeamEntity {
            id: Uuid::new_v4(),
            user_id: None,
            team_name: name.into(),
            is_locked: false,
            roster: Vec::new(),
            created_at: NOW,
            updated_at: NOW,
        };
        let first = team("Blitz");
        store.save_fantasy_team(first.clone()).await.unwrap();
        store.save_fantasy_team(first).await.unwrap();
        let err = store.save_fantasy_team(team(" blitz ")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn increment_requires_profile() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert!(store.increment_total_yards(user, 5).await.is_err());
        store.save_profile(profile(user)).await.unwrap();
        assert_eq!(store.increment_total_yards(user, 5).await.unwrap(), 5);
        assert_eq!(store.increment_total_yards(user, -2).await.unwrap(), 3);
    }
}
