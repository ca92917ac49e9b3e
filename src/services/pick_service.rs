use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PickEntity, PickFilter, PickGameStatus},
    dto::pick::{CreatePickRequest, PickQuery, PickSummary, ResetSeasonResponse},
    error::ServiceError,
    services::lock_service,
    state::{SharedState, week::WeekKey},
};

/// Picks of a user, newest week first.
pub async fn list_picks(
    state: &SharedState,
    user_id: Uuid,
    query: PickQuery,
) -> Result<Vec<PickSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut picks = store
        .list_picks(PickFilter {
            user_id: Some(user_id),
            season: query.season,
            week: query.week,
            ..PickFilter::default()
        })
        .await?;
    sort_newest_first(&mut picks);
    Ok(picks.into_iter().map(Into::into).collect())
}

pub(crate) fn sort_newest_first(picks: &mut [PickEntity]) {
    picks.sort_by(|a, b| {
        b.key()
            .cmp(&a.key())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Pick a running back for a week.
///
/// The week must still be active and the player unlocked; finalization is
/// checked first and cannot complete between the check and the insert.
pub async fn create_pick(
    state: &SharedState,
    user_id: Uuid,
    request: CreatePickRequest,
) -> Result<PickSummary, ServiceError> {
    request.validate()?;
    let store = state.require_store().await?;
    let key = WeekKey::new(request.season, request.week);

    let _gate = state.settle_gate().read().await;
    let week_status = store.week_status(key).await?;
    let lock = lock_service::player_lock(state, store.as_ref(), key, &request.player_id).await?;
    week_status.check_pick_mutation(key, lock)?;

    let rb = store
        .find_running_back(key, &request.player_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "running back {} not found for {key}",
                request.player_id
            ))
        })?;

    let now = state.now();
    let pick = PickEntity {
        id: Uuid::new_v4(),
        user_id,
        season: key.season,
        week: key.week,
        player_id: rb.player_id,
        player_name: rb.name,
        yards_gained: 0,
        is_finalized: false,
        game_status: PickGameStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    store.insert_pick(pick.clone()).await?;

    info!(%user_id, %key, player_id = %pick.player_id, "pick created");
    Ok(pick.into())
}

/// Remove a user's pick for a week, under the same gates as creation.
pub async fn delete_pick(
    state: &SharedState,
    user_id: Uuid,
    key: WeekKey,
) -> Result<PickSummary, ServiceError> {
    let store = state.require_store().await?;
    let _gate = state.settle_gate().read().await;
    let existing = store
        .list_picks(PickFilter {
            user_id: Some(user_id),
            ..PickFilter::for_week(key)
        })
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::NotFound(format!("no pick for {key}")))?;

    let week_status = store.week_status(key).await?;
    let lock = lock_service::player_lock(state, store.as_ref(), key, &existing.player_id).await?;
    week_status.check_pick_mutation(key, lock)?;

    let removed = store
        .delete_picks(user_id, Some(key.season), Some(key.week))
        .await?;
    let yards: i64 = removed.iter().map(|pick| pick.yards_gained).sum();
    if yards != 0 {
        if let Err(err) = store.increment_total_yards(user_id, -yards).await {
            warn!(%user_id, yards, error = %err, "failed to take back pick yards");
        }
    }

    info!(%user_id, %key, "pick deleted");
    Ok(existing.into())
}

/// Delete every pick of the user and zero their total.
pub async fn reset_season(
    state: &SharedState,
    user_id: Uuid,
) -> Result<ResetSeasonResponse, ServiceError> {
    let store = state.require_store().await?;
    let removed = store.delete_picks(user_id, None, None).await?;

    if let Some(mut profile) = store.find_profile(user_id).await? {
        profile.total_yards = 0;
        profile.updated_at = state.now();
        store.save_profile(profile).await?;
    }

    info!(%user_id, picks_deleted = removed.len(), "season reset");
    Ok(ResetSeasonResponse {
        picks_deleted: removed.len(),
        total_yards: 0,
    })
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::{
        dao::{models::WeekSettlement, pickem_store::PickemStore},
        provider::fake::FakeProvider,
        services::{
            ingestion_service::fixtures::{KEY, KICKOFF, pick, profile, running_back},
            lock_service, week_service,
        },
        state::test_support::{Harness, harness},
    };

    fn request(player_id: &str) -> CreatePickRequest {
        CreatePickRequest {
            season: KEY.season,
            week: KEY.week,
            player_id: player_id.into(),
        }
    }

    async fn setup(now: OffsetDateTime) -> Harness {
        let h = harness(FakeProvider::default(), now).await;
        let mut rb = running_back("barkley", "Saquon Barkley", "PHI");
        rb.kickoff = Some(KICKOFF);
        h.store.save_running_back(rb).await.unwrap();
        h
    }

    #[tokio::test]
    async fn create_uses_running_back_name_and_starts_at_zero() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let user = Uuid::new_v4();
        let created = create_pick(&h.state, user, request("barkley")).await.unwrap();
        assert_eq!(created.player_name, "Saquon Barkley");
        assert_eq!(created.yards_gained, 0);
        assert_eq!(created.game_status, PickGameStatus::Pending);

        let duplicate = create_pick(&h.state, user, request("barkley")).await;
        assert!(matches!(duplicate, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn locked_player_rejects_create_and_delete() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let user = Uuid::new_v4();
        create_pick(&h.state, user, request("barkley")).await.unwrap();

        h.clock.set(KICKOFF - Duration::minutes(10));
        let other = create_pick(&h.state, Uuid::new_v4(), request("barkley")).await;
        assert!(matches!(other, Err(ServiceError::InvalidState(_))));
        assert!(matches!(
            delete_pick(&h.state, user, KEY).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn finalized_week_rejects_mutation_even_for_open_player() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let user = Uuid::new_v4();
        h.store
            .save_running_back(running_back("jacobs", "Josh Jacobs", "GB"))
            .await
            .unwrap();
        create_pick(&h.state, user, request("jacobs")).await.unwrap();

        week_service::finalize_week(&h.state, KEY).await.unwrap();
        assert!(!lock_service::is_player_locked(&h.state, KEY, "jacobs").await.unwrap());

        let err = create_pick(&h.state, Uuid::new_v4(), request("jacobs"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("finalized"));
        assert!(matches!(
            delete_pick(&h.state, user, KEY).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn create_waits_for_in_flight_settlement() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let settling = h.state.settle_gate().write().await;

        let state = h.state.clone();
        let pending = tokio::spawn(async move {
            create_pick(&state, Uuid::new_v4(), request("barkley")).await
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());

        h.store
            .settle_week(WeekSettlement {
                season: KEY.season,
                week: KEY.week,
                finalized_at: KICKOFF,
                picks: Vec::new(),
            })
            .await
            .unwrap();
        drop(settling);

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("finalized"));
        assert!(h
            .store
            .list_picks(PickFilter::for_week(KEY))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_player_and_bad_week_are_rejected() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let user = Uuid::new_v4();
        assert!(matches!(
            create_pick(&h.state, user, request("ghost")).await,
            Err(ServiceError::NotFound(_))
        ));

        let mut bad = request("barkley");
        bad.week = 19;
        assert!(matches!(
            create_pick(&h.state, user, bad).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_week_first_and_reset_clears_everything() {
        let h = setup(KICKOFF).await;
        let user = Uuid::new_v4();
        h.store.save_profile(profile(user, 420)).await.unwrap();
        for week in [1, 3, 2] {
            let mut entry = pick(user, "barkley", 140);
            entry.week = week;
            h.store.insert_pick(entry).await.unwrap();
        }

        let picks = list_picks(&h.state, user, PickQuery::default()).await.unwrap();
        let weeks: Vec<u8> = picks.iter().map(|p| p.week).collect();
        assert_eq!(weeks, vec![3, 2, 1]);

        let filtered = list_picks(
            &h.state,
            user,
            PickQuery {
                season: Some(KEY.season),
                week: Some(2),
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered.len(), 1);

        let reset = reset_season(&h.state, user).await.unwrap();
        assert_eq!(reset.picks_deleted, 3);
        let profile = h.store.find_profile(user).await.unwrap().unwrap();
        assert_eq!(profile.total_yards, 0);
        assert!(list_picks(&h.state, user, PickQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_open_pick_frees_the_week() {
        let h = setup(KICKOFF - Duration::days(1)).await;
        let user = Uuid::new_v4();
        create_pick(&h.state, user, request("barkley")).await.unwrap();
        delete_pick(&h.state, user, KEY).await.unwrap();
        assert!(create_pick(&h.state, user, request("barkley")).await.is_ok());
        assert!(matches!(
            delete_pick(&h.state, Uuid::new_v4(), KEY).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
