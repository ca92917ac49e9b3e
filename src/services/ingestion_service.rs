//! Pulls schedules and box scores from the statistics provider and maps them
//! onto running backs, games, picks and profile totals.

use std::collections::{BTreeSet, HashMap};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{GameEntity, PickFilter, RunningBackEntity},
        pickem_store::PickemStore,
    },
    dto::ingestion::{
        AutomatedStatusResponse, LiveGameRushing, LiveRushersResponse, PlayerYardsResult,
        RunningBackList, RunningBackQuery, RunningBackSummary, ScheduleSyncResponse,
        YardsUpdateReport,
    },
    error::ServiceError,
    provider::{
        QueueStatus,
        models::{GameStatistics, WeekSchedule},
    },
    services::sse_events,
    state::{SharedState, lock::PlayerLock, week::WeekKey},
};

/// Box scores fetched during one run, keyed by game id.
type StatsCache = HashMap<String, GameStatistics>;

/// Read a player's rushing yards from the provider.
///
/// Returns `None` while the player's game has not started, or when the player
/// has no game on the schedule, so the stored value stays in place. A finished
/// game without a rushing line counts as zero yards.
pub(crate) async fn fetch_rushing_yards(
    state: &SharedState,
    schedule: &WeekSchedule,
    rb: &RunningBackEntity,
    cache: &mut StatsCache,
) -> Result<Option<i64>, ServiceError> {
    let game = rb
        .game_id
        .as_deref()
        .and_then(|id| schedule.games.iter().find(|game| game.id == id))
        .or_else(|| schedule.game_for_team(&rb.team));
    let Some(game) = game else {
        debug!(player_id = %rb.player_id, team = %rb.team, "no scheduled game for player");
        return Ok(None);
    };
    if !game.status.has_started() {
        return Ok(None);
    }

    if !cache.contains_key(&game.id) {
        let stats = state.provider().game_statistics(&game.id).await?;
        cache.insert(game.id.clone(), stats);
    }
    let Some(stats) = cache.get(&game.id) else {
        return Ok(None);
    };

    Ok(match stats.find_rusher(&rb.player_id, &rb.name) {
        Some(line) => Some(i64::from(line.yards)),
        None if stats.status.is_final() || game.status.is_final() => Some(0),
        None => None,
    })
}

/// Write new yards to the running back, its open picks and their owners' totals.
pub(crate) async fn apply_player_yards(
    state: &SharedState,
    store: &dyn PickemStore,
    key: WeekKey,
    mut rb: RunningBackEntity,
    yards: i64,
) -> Result<PlayerYardsResult, ServiceError> {
    let now = state.now();
    if rb.yards != yards {
        rb.yards = yards;
        rb.updated_at = now;
        store.save_running_back(rb.clone()).await?;
    }

    let filter = PickFilter {
        player_id: Some(rb.player_id.clone()),
        is_finalized: Some(false),
        ..PickFilter::for_week(key)
    };
    let mut picks_updated = 0;
    for mut pick in store.list_picks(filter).await? {
        let delta = yards - pick.yards_gained;
        if delta == 0 {
            continue;
        }
        let user_id = pick.user_id;
        pick.yards_gained = yards;
        pick.updated_at = now;
        store.update_pick(pick).await?;
        picks_updated += 1;

        if let Err(err) = store.increment_total_yards(user_id, delta).await {
            warn!(%user_id, delta, error = %err, "failed to move profile total");
        }
    }

    sse_events::broadcast_yards_updated(state, key, &rb.player_id, yards, picks_updated);
    Ok(PlayerYardsResult {
        player_id: rb.player_id,
        yards,
        picks_updated,
    })
}

async fn require_running_back(
    store: &dyn PickemStore,
    key: WeekKey,
    player_id: &str,
) -> Result<RunningBackEntity, ServiceError> {
    store
        .find_running_back(key, player_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("running back {player_id} not found for {key}"))
        })
}

/// Refresh one player's yards and propagate them to picks and profiles.
pub async fn update_player_yards(
    state: &SharedState,
    key: WeekKey,
    player_id: &str,
) -> Result<PlayerYardsResult, ServiceError> {
    let store = state.require_store().await?;
    let rb = require_running_back(store.as_ref(), key, player_id).await?;
    let schedule = state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await?;

    let mut cache = StatsCache::new();
    match fetch_rushing_yards(state, &schedule, &rb, &mut cache).await? {
        Some(yards) => apply_player_yards(state, store.as_ref(), key, rb, yards).await,
        None => Ok(PlayerYardsResult {
            yards: rb.yards,
            player_id: rb.player_id,
            picks_updated: 0,
        }),
    }
}

/// How a multi-player refresh paces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pacing {
    /// Refresh everything, stopping only when the provider rate limits.
    Full,
    /// Also stop once the trailing-minute count reaches the throttle threshold.
    Throttled,
}

async fn refresh_players(
    state: &SharedState,
    store: &dyn PickemStore,
    key: WeekKey,
    running_backs: Vec<RunningBackEntity>,
    pacing: Pacing,
) -> Result<YardsUpdateReport, ServiceError> {
    let schedule = state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await?;
    let threshold = state.config().throttle_threshold;

    let mut cache = StatsCache::new();
    let mut results = Vec::new();
    let mut errors = 0;
    let mut stopped_early = false;

    for rb in running_backs {
        if pacing == Pacing::Throttled
            && state.queue().status().requests_last_minute >= threshold
        {
            info!(%key, threshold, "provider request threshold reached; stopping refresh");
            stopped_early = true;
            break;
        }

        let player_id = rb.player_id.clone();
        let outcome = match fetch_rushing_yards(state, &schedule, &rb, &mut cache).await {
            Ok(Some(yards)) => apply_player_yards(state, store, key, rb, yards)
                .await
                .map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(ServiceError::RateLimited { .. }) => {
                warn!(%key, %player_id, "provider rate limited; stopping refresh");
                errors += 1;
                stopped_early = true;
                break;
            }
            Err(err) => {
                warn!(%key, %player_id, error = %err, "failed to refresh player yards");
                errors += 1;
            }
        }
    }

    info!(
        %key,
        updated = results.len(),
        errors,
        stopped_early,
        "yards refresh finished"
    );
    Ok(YardsUpdateReport {
        updated_players: results.len(),
        errors,
        stopped_early,
        results,
        provider_queue: state.queue().status(),
    })
}

/// Refresh every running back of the week.
pub async fn update_week_yards(
    state: &SharedState,
    key: WeekKey,
) -> Result<YardsUpdateReport, ServiceError> {
    let store = state.require_store().await?;
    let running_backs = store.list_running_backs(key).await?;
    refresh_players(state, store.as_ref(), key, running_backs, Pacing::Full).await
}

/// Refresh one player when named, otherwise the whole week.
pub async fn update_yards(
    state: &SharedState,
    key: WeekKey,
    player_id: Option<&str>,
) -> Result<YardsUpdateReport, ServiceError> {
    let Some(player_id) = player_id else {
        return update_week_yards(state, key).await;
    };
    let result = update_player_yards(state, key, player_id).await?;
    Ok(YardsUpdateReport {
        updated_players: 1,
        errors: 0,
        stopped_early: false,
        results: vec![result],
        provider_queue: state.queue().status(),
    })
}

/// Refresh only players that sit in open picks, keeping clear of the provider cap.
///
/// Asks the caller to wait instead of starting when the trailing-minute count
/// is already at the threshold.
pub async fn rate_limited_update(
    state: &SharedState,
    key: WeekKey,
    player_id: Option<&str>,
) -> Result<YardsUpdateReport, ServiceError> {
    let config = state.config();
    let queue = state.queue().status();
    if queue.requests_last_minute >= config.throttle_threshold {
        return Err(ServiceError::RateLimited {
            message: "Rate limit approaching, please wait".into(),
            retry_after: config.throttle_retry_after,
        });
    }

    let store = state.require_store().await?;
    let running_backs = match player_id {
        Some(player_id) => vec![require_running_back(store.as_ref(), key, player_id).await?],
        None => {
            let filter = PickFilter {
                is_finalized: Some(false),
                ..PickFilter::for_week(key)
            };
            let selected: BTreeSet<String> = store
                .list_picks(filter)
                .await?
                .into_iter()
                .map(|pick| pick.player_id)
                .collect();

            let mut running_backs = Vec::with_capacity(selected.len());
            for player_id in &selected {
                match store.find_running_back(key, player_id).await? {
                    Some(rb) => running_backs.push(rb),
                    None => warn!(%key, %player_id, "picked player has no running back record"),
                }
            }
            running_backs
        }
    };

    if running_backs.is_empty() {
        return Ok(YardsUpdateReport {
            updated_players: 0,
            errors: 0,
            stopped_early: false,
            results: Vec::new(),
            provider_queue: queue,
        });
    }
    refresh_players(state, store.as_ref(), key, running_backs, Pacing::Throttled).await
}

/// Save the week's games and stamp each running back with its game.
pub async fn sync_schedule(
    state: &SharedState,
    key: WeekKey,
) -> Result<ScheduleSyncResponse, ServiceError> {
    let store = state.require_store().await?;
    let schedule = state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await?;
    let now = state.now();

    let existing: HashMap<String, GameEntity> = store
        .list_games(key)
        .await?
        .into_iter()
        .map(|game| (game.game_id.clone(), game))
        .collect();

    let mut games_saved = 0;
    for game in &schedule.games {
        let previous = existing.get(&game.id);
        store
            .save_game(GameEntity {
                game_id: game.id.clone(),
                season: key.season,
                week: key.week,
                home_team: game.home.clone(),
                away_team: game.away.clone(),
                kickoff: game.kickoff,
                status: game.status,
                quarter: previous.and_then(|g| g.quarter),
                clock: previous.and_then(|g| g.clock.clone()),
                updated_at: now,
            })
            .await?;
        games_saved += 1;
    }

    let mut running_backs_stamped = 0;
    for mut rb in store.list_running_backs(key).await? {
        let Some(game) = schedule.game_for_team(&rb.team) else {
            continue;
        };
        let opponent = game.opponent_of(&rb.team).map(str::to_string);
        if rb.kickoff == game.kickoff
            && rb.game_id.as_deref() == Some(game.id.as_str())
            && rb.opponent == opponent
        {
            continue;
        }
        rb.kickoff = game.kickoff;
        rb.game_id = Some(game.id.clone());
        rb.opponent = opponent;
        rb.updated_at = now;
        store.save_running_back(rb).await?;
        running_backs_stamped += 1;
    }

    info!(%key, games_saved, running_backs_stamped, "schedule synced");
    Ok(ScheduleSyncResponse {
        season: key.season,
        week: key.week,
        games_saved,
        running_backs_stamped,
    })
}

/// Rushing lines of every started game of the week, straight from the provider.
pub async fn live_rushers(
    state: &SharedState,
    key: WeekKey,
) -> Result<LiveRushersResponse, ServiceError> {
    let schedule = state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await?;
    let started: Vec<_> = schedule
        .games
        .into_iter()
        .filter(|game| game.status.has_started())
        .collect();

    let fetched = join_all(
        started
            .iter()
            .map(|game| state.provider().game_statistics(&game.id)),
    )
    .await;

    let mut games = Vec::new();
    let mut unavailable = Vec::new();
    for (game, result) in started.into_iter().zip(fetched) {
        match result {
            Ok(stats) => {
                let mut rushers = stats.rushers;
                rushers.sort_by(|a, b| b.yards.cmp(&a.yards));
                games.push(LiveGameRushing {
                    game_id: game.id,
                    status: stats.status,
                    home: game.home,
                    away: game.away,
                    rushers,
                });
            }
            Err(err) => {
                warn!(game_id = %game.id, error = %err, "failed to fetch live box score");
                unavailable.push(game.id);
            }
        }
    }

    Ok(LiveRushersResponse {
        season: key.season,
        week: key.week,
        games,
        unavailable,
    })
}

/// Whether any stored game of the week is live, and the next kickoff still ahead.
pub async fn automated_status(
    state: &SharedState,
    key: WeekKey,
) -> Result<AutomatedStatusResponse, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();
    let games = store.list_games(key).await?;

    let has_live_games = games.iter().any(|game| game.status.is_live());
    let next_game_time = games
        .iter()
        .filter(|game| !game.status.has_started())
        .filter_map(|game| game.kickoff)
        .filter(|kickoff| *kickoff > now)
        .min();

    Ok(AutomatedStatusResponse {
        has_live_games,
        next_game_time,
        last_update: now,
    })
}

/// Running backs of a week, filtered by a case-insensitive name or team match.
pub async fn search_running_backs(
    state: &SharedState,
    query: RunningBackQuery,
) -> Result<RunningBackList, ServiceError> {
    let store = state.require_store().await?;
    let key = WeekKey::new(query.season, query.week);
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut running_backs: Vec<_> = store
        .list_running_backs(key)
        .await?
        .into_iter()
        .filter(|rb| {
            needle.as_deref().is_none_or(|needle| {
                rb.name.to_lowercase().contains(needle) || rb.team.to_lowercase().contains(needle)
            })
        })
        .collect();
    running_backs.sort_by(|a, b| a.name.cmp(&b.name));

    let policy = state.config().lock_policy;
    let now = state.now();
    let running_backs: Vec<RunningBackSummary> = running_backs
        .into_iter()
        .map(|mut rb| {
            rb.is_locked = policy
                .transition(PlayerLock::from_flag(rb.is_locked), rb.kickoff, now)
                .is_locked();
            rb.into()
        })
        .collect();

    Ok(RunningBackList {
        season: key.season,
        week: key.week,
        total: running_backs.len(),
        running_backs,
    })
}

/// Snapshot of the provider queue.
pub fn provider_status(state: &SharedState) -> QueueStatus {
    state.queue().status()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use time::{OffsetDateTime, macros::datetime};
    use uuid::Uuid;

    use crate::{
        dao::models::{PickEntity, PickGameStatus, ProfileEntity, RunningBackEntity},
        provider::models::{GameStatistics, GameStatus, RushingLine, ScheduledGame, WeekSchedule},
        state::week::WeekKey,
    };

    pub const KEY: WeekKey = WeekKey {
        season: 2024,
        week: 1,
    };
    pub const KICKOFF: OffsetDateTime = datetime!(2024-09-08 17:00 UTC);

    pub fn schedule(status: GameStatus) -> WeekSchedule {
        WeekSchedule {
            season: KEY.season,
            week: KEY.week,
            games: vec![ScheduledGame {
                id: "g1".into(),
                status,
                kickoff: Some(KICKOFF),
                home: "PHI".into(),
                away: "GB".into(),
                home_id: Some("team-phi".into()),
                away_id: Some("team-gb".into()),
            }],
        }
    }

    pub fn statistics(status: GameStatus, yards: i32) -> GameStatistics {
        GameStatistics {
            game_id: "g1".into(),
            status,
            rushers: vec![RushingLine {
                player_id: "barkley".into(),
                name: "Saquon Barkley".into(),
                team: "PHI".into(),
                attempts: 24,
                yards,
                touchdowns: 2,
            }],
        }
    }

    pub fn running_back(player_id: &str, name: &str, team: &str) -> RunningBackEntity {
        RunningBackEntity {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            name: name.into(),
            team: team.into(),
            opponent: None,
            season: KEY.season,
            week: KEY.week,
            yards: 0,
            games_played: 0,
            game_id: None,
            kickoff: None,
            is_locked: false,
            manual_entry: false,
            updated_at: KICKOFF,
        }
    }

    pub fn profile(id: Uuid, total_yards: i64) -> ProfileEntity {
        ProfileEntity {
            id,
            email: format!("{id}@example.com"),
            team_name: "Ground and Pound".into(),
            team_logo_data: None,
            total_yards,
            created_at: KICKOFF,
            updated_at: KICKOFF,
        }
    }

    pub fn pick(user_id: Uuid, player_id: &str, yards: i64) -> PickEntity {
        PickEntity {
            id: Uuid::new_v4(),
            user_id,
            season: KEY.season,
            week: KEY.week,
            player_id: player_id.into(),
            player_name: player_id.into(),
            yards_gained: yards,
            is_finalized: false,
            game_status: PickGameStatus::Pending,
            created_at: KICKOFF,
            updated_at: KICKOFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use uuid::Uuid;

    use super::{fixtures::*, *};
    use crate::{
        config::AppConfig,
        provider::{
            fake::FakeProvider,
            models::{GameStatus, RushingLine},
        },
        state::test_support::{harness, harness_with_config},
    };

    #[tokio::test]
    async fn player_update_moves_picks_and_totals_by_delta() {
        let provider = FakeProvider::default()
            .with_schedule(schedule(GameStatus::Inprogress))
            .with_statistics(statistics(GameStatus::Inprogress, 87));
        let h = harness(provider, KICKOFF + Duration::hours(1)).await;
        let user = Uuid::new_v4();
        h.store.save_profile(profile(user, 150)).await.unwrap();
        h.store
            .save_running_back(running_back("barkley", "Saquon Barkley", "PHI"))
            .await
            .unwrap();
        h.store.insert_pick(pick(user, "barkley", 40)).await.unwrap();

        let result = update_player_yards(&h.state, KEY, "barkley").await.unwrap();
        assert_eq!(result.yards, 87);
        assert_eq!(result.picks_updated, 1);

        let profile = h.store.find_profile(user).await.unwrap().unwrap();
        assert_eq!(profile.total_yards, 197);
        let rb = h.store.find_running_back(KEY, "barkley").await.unwrap().unwrap();
        assert_eq!(rb.yards, 87);

        // a second identical read changes nothing
        let again = update_player_yards(&h.state, KEY, "barkley").await.unwrap();
        assert_eq!(again.picks_updated, 0);
        let profile = h.store.find_profile(user).await.unwrap().unwrap();
        assert_eq!(profile.total_yards, 197);
    }

    #[tokio::test]
    async fn game_not_started_keeps_stored_yards() {
        let provider = FakeProvider::default().with_schedule(schedule(GameStatus::Scheduled));
        let h = harness(provider, KICKOFF - Duration::hours(1)).await;
        let mut rb = running_back("barkley", "Saquon Barkley", "PHI");
        rb.yards = 12;
        h.store.save_running_back(rb).await.unwrap();

        let result = update_player_yards(&h.state, KEY, "barkley").await.unwrap();
        assert_eq!(result.yards, 12);
        assert_eq!(result.picks_updated, 0);
    }

    #[tokio::test]
    async fn final_game_without_line_counts_zero() {
        let provider = FakeProvider::default()
            .with_schedule(schedule(GameStatus::Closed))
            .with_statistics(statistics(GameStatus::Closed, 120));
        let h = harness(provider, KICKOFF + Duration::hours(5)).await;
        let mut rb = running_back("jacobs", "Josh Jacobs", "GB");
        rb.yards = 30;
        h.store.save_running_back(rb).await.unwrap();

        let result = update_player_yards(&h.state, KEY, "jacobs").await.unwrap();
        assert_eq!(result.yards, 0);
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let h = harness(FakeProvider::default(), KICKOFF).await;
        assert!(matches!(
            update_player_yards(&h.state, KEY, "ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let provider = FakeProvider::default();
        provider.set_failing(true);
        let h = harness(provider, KICKOFF).await;
        h.store
            .save_running_back(running_back("barkley", "Saquon Barkley", "PHI"))
            .await
            .unwrap();
        assert!(matches!(
            update_player_yards(&h.state, KEY, "barkley").await,
            Err(ServiceError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn rate_limited_update_only_touches_picked_players() {
        let provider = FakeProvider::default()
            .with_schedule(schedule(GameStatus::Inprogress))
            .with_statistics(statistics(GameStatus::Inprogress, 55));
        let h = harness(provider, KICKOFF + Duration::hours(1)).await;
        let user = Uuid::new_v4();
        h.store.save_profile(profile(user, 0)).await.unwrap();
        h.store
            .save_running_back(running_back("barkley", "Saquon Barkley", "PHI"))
            .await
            .unwrap();
        h.store
            .save_running_back(running_back("jacobs", "Josh Jacobs", "GB"))
            .await
            .unwrap();
        h.store.insert_pick(pick(user, "barkley", 0)).await.unwrap();

        let report = rate_limited_update(&h.state, KEY, None).await.unwrap();
        assert_eq!(report.updated_players, 1);
        assert_eq!(report.results[0].player_id, "barkley");
        assert!(!report.stopped_early);

        let jacobs = h.store.find_running_back(KEY, "jacobs").await.unwrap().unwrap();
        assert_eq!(jacobs.yards, 0);
    }

    #[tokio::test]
    async fn rate_limited_update_asks_to_wait_at_threshold() {
        let config = AppConfig {
            throttle_threshold: 0,
            ..AppConfig::default()
        };
        let h = harness_with_config(FakeProvider::default(), KICKOFF, config).await;
        match rate_limited_update(&h.state, KEY, None).await {
            Err(ServiceError::RateLimited { retry_after, .. }) => {
                assert_eq!(retry_after.as_secs(), 60);
            }
            other => panic!("expected rate limited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn schedule_sync_stamps_kickoff_and_opponent() {
        let provider = FakeProvider::default().with_schedule(schedule(GameStatus::Scheduled));
        let h = harness(provider, KICKOFF - Duration::days(2)).await;
        h.store
            .save_running_back(running_back("jacobs", "Josh Jacobs", "GB"))
            .await
            .unwrap();
        h.store
            .save_running_back(running_back("henry", "Derrick Henry", "BAL"))
            .await
            .unwrap();

        let report = sync_schedule(&h.state, KEY).await.unwrap();
        assert_eq!(report.games_saved, 1);
        assert_eq!(report.running_backs_stamped, 1);

        let jacobs = h.store.find_running_back(KEY, "jacobs").await.unwrap().unwrap();
        assert_eq!(jacobs.kickoff, Some(KICKOFF));
        assert_eq!(jacobs.opponent.as_deref(), Some("PHI"));
        assert_eq!(jacobs.game_id.as_deref(), Some("g1"));

        let status = automated_status(&h.state, KEY).await.unwrap();
        assert!(!status.has_live_games);
        assert_eq!(status.next_game_time, Some(KICKOFF));
    }

    #[tokio::test]
    async fn live_rushers_sorted_by_yards() {
        let mut stats = statistics(GameStatus::Inprogress, 40);
        stats.rushers.push(RushingLine {
            player_id: "jacobs".into(),
            name: "Josh Jacobs".into(),
            team: "GB".into(),
            attempts: 15,
            yards: 71,
            touchdowns: 0,
        });
        let provider = FakeProvider::default()
            .with_schedule(schedule(GameStatus::Inprogress))
            .with_statistics(stats);
        let h = harness(provider, KICKOFF + Duration::hours(1)).await;

        let live = live_rushers(&h.state, KEY).await.unwrap();
        assert_eq!(live.games.len(), 1);
        assert_eq!(live.games[0].rushers[0].player_id, "jacobs");
        assert!(live.unavailable.is_empty());
    }

    #[tokio::test]
    async fn search_matches_name_or_team_and_reports_live_locks() {
        let h = harness(FakeProvider::default(), KICKOFF).await;
        let mut barkley = running_back("barkley", "Saquon Barkley", "PHI");
        barkley.kickoff = Some(KICKOFF);
        h.store.save_running_back(barkley).await.unwrap();
        h.store
            .save_running_back(running_back("jacobs", "Josh Jacobs", "GB"))
            .await
            .unwrap();

        let query = |q: &str| RunningBackQuery {
            season: KEY.season,
            week: KEY.week,
            q: Some(q.into()),
        };
        let by_name = search_running_backs(&h.state, query("saquon")).await.unwrap();
        assert_eq!(by_name.total, 1);
        assert!(by_name.running_backs[0].is_locked);
        let by_team = search_running_backs(&h.state, query("gb")).await.unwrap();
        assert_eq!(by_team.running_backs[0].player_id, "jacobs");
        assert!(!by_team.running_backs[0].is_locked);
        let all = search_running_backs(&h.state, query("  ")).await.unwrap();
        assert_eq!(all.total, 2);
    }
}
