use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::{
    dao::models::{PickFilter, SettledPick, WeekSettlement},
    dto::week::{FinalizeWeekResponse, WeekStatusResponse},
    error::ServiceError,
    services::{ingestion_service, sse_events},
    state::{SharedState, week::WeekKey},
};

/// Finalization state of a week.
pub async fn week_status(
    state: &SharedState,
    key: WeekKey,
) -> Result<WeekStatusResponse, ServiceError> {
    let store = state.require_store().await?;
    let status = store.week_status(key).await?;
    Ok(WeekStatusResponse {
        season: key.season,
        week: key.week,
        status,
    })
}

/// Shorthand for the finalized flag.
pub async fn is_week_finalized(state: &SharedState, key: WeekKey) -> Result<bool, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.week_status(key).await?.is_finalized())
}

/// Close a week for good.
///
/// Yards of every picked player are read once more from the provider; a player
/// whose read fails keeps the stored value. The settled yards, profile totals
/// and the finalized flag are then written in one store operation. Concurrent
/// calls are serialized and the loser is rejected as already finalized.
pub async fn finalize_week(
    state: &SharedState,
    key: WeekKey,
) -> Result<FinalizeWeekResponse, ServiceError> {
    let store = state.require_store().await?;
    let _gate = state.settle_gate().write().await;
    let finalized_at = state.now();

    store.week_status(key).await?.finalize(key, finalized_at)?;

    let picks = store.list_picks(PickFilter::for_week(key)).await?;
    let player_ids: BTreeSet<&str> = picks.iter().map(|pick| pick.player_id.as_str()).collect();

    let mut fresh: HashMap<String, i64> = HashMap::new();
    match state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await
    {
        Ok(schedule) => {
            let mut cache = HashMap::new();
            for player_id in player_ids {
                let Some(mut rb) = store.find_running_back(key, player_id).await? else {
                    continue;
                };
                match ingestion_service::fetch_rushing_yards(state, &schedule, &rb, &mut cache)
                    .await
                {
                    Ok(Some(yards)) => {
                        if rb.yards != yards {
                            rb.yards = yards;
                            rb.updated_at = finalized_at;
                            if let Err(err) = store.save_running_back(rb).await {
                                warn!(%key, %player_id, error = %err, "failed to store final yards");
                            }
                        }
                        fresh.insert(player_id.to_string(), yards);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(%key, %player_id, error = %err, "final yards read failed; keeping stored value");
                    }
                }
            }
        }
        Err(err) => {
            warn!(%key, error = %err, "schedule unavailable; settling with stored yards");
        }
    }

    let mut yards_refreshed = 0;
    let settled = picks
        .iter()
        .map(|pick| {
            let yards = match fresh.get(&pick.player_id) {
                Some(yards) => {
                    yards_refreshed += 1;
                    *yards
                }
                None => pick.yards_gained,
            };
            SettledPick {
                pick_id: pick.id,
                yards,
            }
        })
        .collect();

    let report = store
        .settle_week(WeekSettlement {
            season: key.season,
            week: key.week,
            finalized_at,
            picks: settled,
        })
        .await?;

    info!(
        %key,
        picks_settled = report.picks_settled,
        profiles_updated = report.profiles_updated,
        yards_refreshed,
        "week finalized"
    );
    sse_events::broadcast_week_finalized(state, key, finalized_at, report.picks_settled);

    Ok(FinalizeWeekResponse {
        season: key.season,
        week: key.week,
        finalized_at,
        picks_settled: report.picks_settled,
        profiles_updated: report.profiles_updated,
        yards_refreshed,
    })
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::{
        dao::{models::PickGameStatus, pickem_store::PickemStore},
        provider::{fake::FakeProvider, models::GameStatus},
        services::ingestion_service::fixtures::*,
        state::test_support::harness,
    };

    #[tokio::test]
    async fn finalize_settles_fresh_yards_and_totals() {
        let provider = FakeProvider::default()
            .with_schedule(schedule(GameStatus::Closed))
            .with_statistics(statistics(GameStatus::Closed, 104));
        let h = harness(provider, KICKOFF + Duration::days(1)).await;
        let user = Uuid::new_v4();
        h.store.save_profile(profile(user, 300)).await.unwrap();
        h.store
            .save_running_back(running_back("barkley", "Saquon Barkley", "PHI"))
            .await
            .unwrap();
        h.store.insert_pick(pick(user, "barkley", 60)).await.unwrap();

        let response = finalize_week(&h.state, KEY).await.unwrap();
        assert_eq!(response.picks_settled, 1);
        assert_eq!(response.yards_refreshed, 1);
        assert!(is_week_finalized(&h.state, KEY).await.unwrap());

        let profile = h.store.find_profile(user).await.unwrap().unwrap();
        assert_eq!(profile.total_yards, 344);
        let picks = h.store.list_picks(PickFilter::for_week(KEY)).await.unwrap();
        assert!(picks[0].is_finalized);
        assert_eq!(picks[0].game_status, PickGameStatus::Final);
        assert_eq!(picks[0].yards_gained, 104);
    }

    #[tokio::test]
    async fn provider_outage_settles_stored_yards() {
        let provider = FakeProvider::default();
        provider.set_failing(true);
        let h = harness(provider, KICKOFF + Duration::days(1)).await;
        let user = Uuid::new_v4();
        h.store.save_profile(profile(user, 60)).await.unwrap();
        h.store.insert_pick(pick(user, "barkley", 60)).await.unwrap();

        let response = finalize_week(&h.state, KEY).await.unwrap();
        assert_eq!(response.yards_refreshed, 0);
        assert_eq!(response.picks_settled, 1);
        let profile = h.store.find_profile(user).await.unwrap().unwrap();
        assert_eq!(profile.total_yards, 60);
    }

    #[tokio::test]
    async fn second_finalize_is_rejected() {
        let h = harness(FakeProvider::default(), KICKOFF).await;
        finalize_week(&h.state, KEY).await.unwrap();
        assert!(matches!(
            finalize_week(&h.state, KEY).await,
            Err(ServiceError::InvalidState(_))
        ));

        let status = week_status(&h.state, KEY).await.unwrap();
        assert!(status.status.is_finalized());
    }

    #[tokio::test]
    async fn other_weeks_stay_active() {
        let h = harness(FakeProvider::default(), KICKOFF).await;
        finalize_week(&h.state, KEY).await.unwrap();
        assert!(
            !is_week_finalized(&h.state, WeekKey::new(KEY.season, KEY.week + 1))
                .await
                .unwrap()
        );
    }
}
