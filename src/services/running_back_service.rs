//! Fills the weekly running back pool: cached from team rosters through the
//! provider queue, or typed in by an operator when the feed falls short.

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PickFilter, RunningBackEntity},
    dto::{
        ingestion::{RunningBackList, RunningBackSummary},
        running_back::{
            ManualEntriesReport, ManualEntriesRequest, ManualEntryKey, ManualRunningBack,
            RunningBackCacheReport,
        },
    },
    error::ServiceError,
    provider::models::ScheduledGame,
    services::ingestion_service,
    state::{SharedState, lock::PlayerLock, week::WeekKey},
};

/// Read the roster of every team playing this week and upsert its running backs.
///
/// New rows start at zero yards. Existing rows keep their yards and only move
/// their name, team, game and lock forward. A rate-limited roster read stops
/// the run; other roster failures are counted and skipped.
pub async fn cache_running_backs(
    state: &SharedState,
    key: WeekKey,
) -> Result<RunningBackCacheReport, ServiceError> {
    let store = state.require_store().await?;
    let schedule = state
        .provider()
        .weekly_schedule(key.season, key.week)
        .await?;
    let policy = state.config().lock_policy;
    let now = state.now();

    let mut report = RunningBackCacheReport {
        season: key.season,
        week: key.week,
        teams_fetched: 0,
        total: 0,
        cached: 0,
        updated: 0,
        errors: 0,
        stopped_early: false,
        provider_queue: state.queue().status(),
    };

    'games: for game in &schedule.games {
        for (team, team_id) in game.sides() {
            let Some(team_id) = team_id else {
                warn!(%key, game_id = %game.id, %team, "scheduled team has no provider id");
                report.errors += 1;
                continue;
            };

            let roster = match state.provider().team_roster(team_id).await {
                Ok(roster) => roster,
                Err(err) => match ServiceError::from(err) {
                    ServiceError::RateLimited { .. } => {
                        warn!(%key, %team, "provider rate limited; stopping roster cache");
                        report.errors += 1;
                        report.stopped_early = true;
                        break 'games;
                    }
                    err => {
                        warn!(%key, %team, error = %err, "failed to read team roster");
                        report.errors += 1;
                        continue;
                    }
                },
            };
            report.teams_fetched += 1;

            for player in roster.players.into_iter().filter(|p| p.is_running_back()) {
                report.total += 1;
                let existing = store.find_running_back(key, &player.player_id).await?;
                let created = existing.is_none();
                let mut rb = existing.unwrap_or_else(|| RunningBackEntity {
                    id: Uuid::new_v4(),
                    player_id: player.player_id.clone(),
                    name: String::new(),
                    team: String::new(),
                    opponent: None,
                    season: key.season,
                    week: key.week,
                    yards: 0,
                    games_played: 1,
                    game_id: None,
                    kickoff: None,
                    is_locked: false,
                    manual_entry: false,
                    updated_at: now,
                });
                stamp_game(&mut rb, game, team);
                rb.name = player.name;
                rb.is_locked = policy
                    .transition(PlayerLock::from_flag(rb.is_locked), rb.kickoff, now)
                    .is_locked();
                rb.updated_at = now;

                let player_id = rb.player_id.clone();
                match store.save_running_back(rb).await {
                    Ok(()) if created => report.cached += 1,
                    Ok(()) => report.updated += 1,
                    Err(err) => {
                        warn!(%key, %player_id, error = %err, "failed to cache running back");
                        report.errors += 1;
                    }
                }
            }
        }
    }

    report.provider_queue = state.queue().status();
    info!(
        %key,
        teams = report.teams_fetched,
        cached = report.cached,
        updated = report.updated,
        errors = report.errors,
        "running backs cached"
    );
    Ok(report)
}

fn stamp_game(rb: &mut RunningBackEntity, game: &ScheduledGame, team: &str) {
    rb.team = team.to_string();
    rb.opponent = game.opponent_of(team).map(str::to_string);
    rb.game_id = Some(game.id.clone());
    rb.kickoff = game.kickoff;
}

/// Create or overwrite running back lines by hand and carry the yards into open picks.
///
/// Rejected once the week is finalized. Manual lines default to locked, and a
/// locked row never reopens.
pub async fn upsert_manual_entries(
    state: &SharedState,
    request: ManualEntriesRequest,
) -> Result<ManualEntriesReport, ServiceError> {
    request.validate()?;
    let store = state.require_store().await?;
    let key = WeekKey::new(request.season, request.week);
    let now = state.now();

    let _gate = state.settle_gate().read().await;
    store.week_status(key).await?.ensure_open(key)?;

    let mut report = ManualEntriesReport::default();
    for entry in request.players {
        let yards = entry.yards;
        let rb = match store.find_running_back(key, &entry.player_id).await? {
            Some(existing) => {
                report.updated += 1;
                merge_manual(existing, entry, now)
            }
            None => {
                report.created += 1;
                let blank = RunningBackEntity {
                    id: Uuid::new_v4(),
                    player_id: entry.player_id.clone(),
                    name: String::new(),
                    team: String::new(),
                    opponent: None,
                    season: key.season,
                    week: key.week,
                    yards: 0,
                    games_played: 1,
                    game_id: None,
                    kickoff: None,
                    is_locked: false,
                    manual_entry: true,
                    updated_at: now,
                };
                merge_manual(blank, entry, now)
            }
        };

        store.save_running_back(rb.clone()).await?;
        let result =
            ingestion_service::apply_player_yards(state, store.as_ref(), key, rb, yards).await?;
        report.picks_updated += result.picks_updated;
    }

    info!(
        %key,
        created = report.created,
        updated = report.updated,
        picks_updated = report.picks_updated,
        "manual running back lines stored"
    );
    Ok(report)
}

fn merge_manual(
    mut rb: RunningBackEntity,
    entry: ManualRunningBack,
    now: time::OffsetDateTime,
) -> RunningBackEntity {
    rb.name = entry.name.trim().to_string();
    rb.team = entry.team.trim().to_uppercase();
    if let Some(opponent) = entry.opponent {
        rb.opponent = Some(opponent.trim().to_uppercase());
    }
    if entry.kickoff.is_some() {
        rb.kickoff = entry.kickoff;
    }
    rb.yards = entry.yards;
    rb.games_played = entry.games_played.unwrap_or(1);
    rb.is_locked = rb.is_locked || entry.is_locked.unwrap_or(true);
    rb.manual_entry = true;
    rb.updated_at = now;
    rb
}

/// Manual lines of a week, most yards first.
pub async fn list_manual_entries(
    state: &SharedState,
    key: WeekKey,
) -> Result<RunningBackList, ServiceError> {
    let store = state.require_store().await?;
    let mut entries: Vec<RunningBackEntity> = store
        .list_running_backs(key)
        .await?
        .into_iter()
        .filter(|rb| rb.manual_entry)
        .collect();
    entries.sort_by(|a, b| b.yards.cmp(&a.yards).then_with(|| a.name.cmp(&b.name)));

    let running_backs: Vec<RunningBackSummary> = entries.into_iter().map(Into::into).collect();
    Ok(RunningBackList {
        season: key.season,
        week: key.week,
        total: running_backs.len(),
        running_backs,
    })
}

/// Remove a manual line that nobody picked.
pub async fn delete_manual_entry(
    state: &SharedState,
    entry: ManualEntryKey,
) -> Result<(), ServiceError> {
    entry.validate()?;
    let store = state.require_store().await?;
    let key = WeekKey::new(entry.season, entry.week);
    let player_id = entry.player_id.as_str();

    let rb = store
        .find_running_back(key, player_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("running back {player_id} not found for {key}"))
        })?;
    if !rb.manual_entry {
        return Err(ServiceError::InvalidState(format!(
            "running back {player_id} comes from the provider and cannot be deleted"
        )));
    }

    let picked = store
        .list_picks(PickFilter {
            player_id: Some(player_id.to_string()),
            ..PickFilter::for_week(key)
        })
        .await?;
    if !picked.is_empty() {
        return Err(ServiceError::InvalidState(format!(
            "running back {player_id} is picked {} time(s) for {key}",
            picked.len()
        )));
    }

    store.delete_running_back(key, player_id).await?;
    info!(%key, %player_id, "manual running back removed");
    Ok(())
}
