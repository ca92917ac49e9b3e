//! Player lock sweep and pick status bookkeeping.

use std::collections::HashMap;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{PickFilter, PickGameStatus},
        pickem_store::PickemStore,
    },
    dto::week::LockRefreshResponse,
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        lock::PlayerLock,
        week::{WeekKey, WeekStatus},
    },
};

/// Current lock of a player for a week.
///
/// A persisted lock always wins; otherwise the kickoff decides. A player with
/// no record for the week has no known kickoff and is open.
pub async fn player_lock(
    state: &SharedState,
    store: &dyn PickemStore,
    key: WeekKey,
    player_id: &str,
) -> Result<PlayerLock, ServiceError> {
    let policy = state.config().lock_policy;
    let now = state.now();
    let lock = match store.find_running_back(key, player_id).await? {
        Some(rb) => policy.transition(PlayerLock::from_flag(rb.is_locked), rb.kickoff, now),
        None => PlayerLock::Open,
    };
    Ok(lock)
}

/// Whether picks on the player are closed right now.
pub async fn is_player_locked(
    state: &SharedState,
    key: WeekKey,
    player_id: &str,
) -> Result<bool, ServiceError> {
    let store = state.require_store().await?;
    Ok(player_lock(state, store.as_ref(), key, player_id)
        .await?
        .is_locked())
}

/// Lock every player of the week whose lock time has passed, then advance pick statuses.
///
/// Only flips are written. A failed write is logged and counted and the sweep
/// carries on with the next player.
pub async fn refresh_locks(
    state: &SharedState,
    key: WeekKey,
) -> Result<LockRefreshResponse, ServiceError> {
    let store = state.require_store().await?;
    let policy = state.config().lock_policy;
    let now = state.now();

    let mut report = LockRefreshResponse {
        season: key.season,
        week: key.week,
        ..LockRefreshResponse::default()
    };
    let mut locks = HashMap::new();

    for rb in store.list_running_backs(key).await? {
        report.checked += 1;
        let current = PlayerLock::from_flag(rb.is_locked);
        let next = policy.transition(current, rb.kickoff, now);

        if current.is_locked() {
            report.already_locked += 1;
        } else if next.is_locked() {
            match store.set_player_lock(key, &rb.player_id, true).await {
                Ok(()) => {
                    debug!(player_id = %rb.player_id, %key, "player locked");
                    report.newly_locked.push(rb.player_id.clone());
                }
                Err(err) => {
                    warn!(player_id = %rb.player_id, %key, error = %err, "failed to persist player lock");
                    report.failures += 1;
                }
            }
        }
        locks.insert(rb.player_id, next);
    }

    let week_status = store.week_status(key).await?;
    report.picks_updated = advance_pick_statuses(
        store.as_ref(),
        key,
        week_status,
        &locks,
        &mut report.failures,
    )
    .await?;

    info!(
        %key,
        checked = report.checked,
        newly_locked = report.newly_locked.len(),
        failures = report.failures,
        picks_updated = report.picks_updated,
        "lock sweep finished"
    );
    sse_events::broadcast_locks_refreshed(state, &report);
    Ok(report)
}

async fn advance_pick_statuses(
    store: &dyn PickemStore,
    key: WeekKey,
    week_status: WeekStatus,
    locks: &HashMap<String, PlayerLock>,
    failures: &mut usize,
) -> Result<usize, ServiceError> {
    let mut updated = 0;
    for mut pick in store.list_picks(PickFilter::for_week(key)).await? {
        let target = if week_status.is_finalized() {
            PickGameStatus::Final
        } else if locks.get(&pick.player_id).is_some_and(|lock| lock.is_locked()) {
            PickGameStatus::Locked
        } else {
            PickGameStatus::Pending
        };

        let next = pick.game_status.advance(target);
        if next == pick.game_status {
            continue;
        }
        pick.game_status = next;
        match store.update_pick(pick).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(%key, error = %err, "failed to update pick status");
                *failures += 1;
            }
        }
    }
    Ok(updated)
}

/// Periodically sweep the current week's locks.
pub async fn run_lock_sweeper(state: SharedState) {
    let mut ticker = interval(state.config().lock_sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if state.is_degraded() {
            debug!("skipping lock sweep while degraded");
            continue;
        }
        let key = WeekKey::current(state.now());
        if let Err(err) = refresh_locks(&state, key).await {
            warn!(%key, error = %err, "scheduled lock sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};
    use uuid::Uuid;

    use super::*;
    use crate::{
        dao::models::{PickEntity, RunningBackEntity},
        provider::fake::FakeProvider,
        state::test_support::{Harness, harness},
    };

    const KICKOFF: OffsetDateTime = datetime!(2024-09-08 17:00 UTC);
    const KEY: WeekKey = WeekKey {
        season: 2024,
        week: 1,
    };

    fn running_back(player_id: &str, kickoff: Option<OffsetDateTime>) -> RunningBackEntity {
        RunningBackEntity {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            name: format!("Runner {player_id}"),
            team: "PHI".into(),
            opponent: Some("GB".into()),
            season: KEY.season,
            week: KEY.week,
            yards: 0,
            games_played: 0,
            game_id: None,
            kickoff,
            is_locked: false,
            manual_entry: false,
            updated_at: KICKOFF,
        }
    }

    fn pick(player_id: &str) -> PickEntity {
        PickEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            season: KEY.season,
            week: KEY.week,
            player_id: player_id.into(),
            player_name: "Runner".into(),
            yards_gained: 0,
            is_finalized: false,
            game_status: PickGameStatus::Pending,
            created_at: KICKOFF,
            updated_at: KICKOFF,
        }
    }

    async fn setup(now: OffsetDateTime) -> Harness {
        let h = harness(FakeProvider::default(), now).await;
        h.store
            .save_running_back(running_back("rb-1", Some(KICKOFF)))
            .await
            .unwrap();
        h.store
            .save_running_back(running_back("rb-tbd", None))
            .await
            .unwrap();
        h
    }

    #[tokio::test]
    async fn lock_follows_kickoff_and_never_reopens() {
        let h = setup(KICKOFF - Duration::minutes(20)).await;
        assert!(!is_player_locked(&h.state, KEY, "rb-1").await.unwrap());

        h.clock.set(KICKOFF - Duration::minutes(10));
        let report = refresh_locks(&h.state, KEY).await.unwrap();
        assert_eq!(report.newly_locked, vec!["rb-1".to_string()]);
        assert!(is_player_locked(&h.state, KEY, "rb-1").await.unwrap());

        // Clock skew backwards does not unlock a persisted lock.
        h.clock.set(KICKOFF - Duration::hours(2));
        assert!(is_player_locked(&h.state, KEY, "rb-1").await.unwrap());
        let again = refresh_locks(&h.state, KEY).await.unwrap();
        assert!(again.newly_locked.is_empty());
        assert_eq!(again.already_locked, 1);
    }

    #[tokio::test]
    async fn unknown_kickoff_and_unknown_player_stay_open() {
        let h = setup(KICKOFF + Duration::days(2)).await;
        assert!(!is_player_locked(&h.state, KEY, "rb-tbd").await.unwrap());
        assert!(!is_player_locked(&h.state, KEY, "nobody").await.unwrap());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let h = setup(KICKOFF).await;
        let first = refresh_locks(&h.state, KEY).await.unwrap();
        let second = refresh_locks(&h.state, KEY).await.unwrap();
        assert_eq!(first.newly_locked.len(), 1);
        assert!(second.newly_locked.is_empty());
        assert_eq!(second.already_locked, 1);
        assert_eq!(second.checked, 2);
    }

    #[tokio::test]
    async fn failed_write_is_counted_and_sweep_continues() {
        let h = setup(KICKOFF).await;
        h.store
            .save_running_back(running_back("rb-2", Some(KICKOFF)))
            .await
            .unwrap();
        h.store.fail_lock_writes("rb-1");

        let report = refresh_locks(&h.state, KEY).await.unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.newly_locked, vec!["rb-2".to_string()]);
    }

    #[tokio::test]
    async fn pick_status_advances_with_locks() {
        let h = setup(KICKOFF - Duration::minutes(30)).await;
        let locked_pick = pick("rb-1");
        let open_pick = pick("rb-tbd");
        h.store.insert_pick(locked_pick.clone()).await.unwrap();
        h.store.insert_pick(open_pick.clone()).await.unwrap();

        let early = refresh_locks(&h.state, KEY).await.unwrap();
        assert_eq!(early.picks_updated, 0);

        h.clock.set(KICKOFF);
        let report = refresh_locks(&h.state, KEY).await.unwrap();
        assert_eq!(report.picks_updated, 1);

        let picks = h.store.list_picks(PickFilter::for_week(KEY)).await.unwrap();
        let status_of = |id| {
            picks
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.game_status)
                .unwrap()
        };
        assert_eq!(status_of(locked_pick.id), PickGameStatus::Locked);
        assert_eq!(status_of(open_pick.id), PickGameStatus::Pending);
    }
}
