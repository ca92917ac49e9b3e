use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    dto::{
        sse::{
            LeaderboardChangedEvent, LocksRefreshedEvent, ServerEvent, SystemStatus,
            WeekFinalizedEvent, YardsUpdatedEvent,
        },
        week::LockRefreshResponse,
    },
    state::{SharedState, week::WeekKey},
};

const EVENT_LOCKS_REFRESHED: &str = "locks.refreshed";
const EVENT_YARDS_UPDATED: &str = "yards.updated";
const EVENT_WEEK_FINALIZED: &str = "week.finalized";
const EVENT_LEADERBOARD_CHANGED: &str = "leaderboard.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the outcome of a lock sweep that locked at least one player.
pub fn broadcast_locks_refreshed(state: &SharedState, report: &LockRefreshResponse) {
    if report.newly_locked.is_empty() {
        return;
    }
    let payload = LocksRefreshedEvent {
        season: report.season,
        week: report.week,
        newly_locked: report.newly_locked.clone(),
        failures: report.failures,
    };
    send_public_event(state, EVENT_LOCKS_REFRESHED, &payload);
    send_admin_event(state, EVENT_LOCKS_REFRESHED, &payload);
}

/// Broadcast a refreshed yard count and nudge leaderboards when picks moved.
pub fn broadcast_yards_updated(
    state: &SharedState,
    key: WeekKey,
    player_id: &str,
    yards: i64,
    picks_updated: usize,
) {
    let payload = YardsUpdatedEvent {
        season: key.season,
        week: key.week,
        player_id: player_id.to_string(),
        yards,
        picks_updated,
    };
    send_public_event(state, EVENT_YARDS_UPDATED, &payload);
    if picks_updated > 0 {
        broadcast_leaderboard_changed(state, key);
    }
}

/// Announce a settled week on both streams.
pub fn broadcast_week_finalized(
    state: &SharedState,
    key: WeekKey,
    finalized_at: OffsetDateTime,
    picks_settled: usize,
) {
    let payload = WeekFinalizedEvent {
        season: key.season,
        week: key.week,
        finalized_at,
        picks_settled,
    };
    send_public_event(state, EVENT_WEEK_FINALIZED, &payload);
    send_admin_event(state, EVENT_WEEK_FINALIZED, &payload);
    broadcast_leaderboard_changed(state, key);
}

/// Tell clients to refetch standings.
pub fn broadcast_leaderboard_changed(state: &SharedState, key: WeekKey) {
    let payload = LeaderboardChangedEvent {
        season: key.season,
        week: key.week,
    };
    send_public_event(state, EVENT_LEADERBOARD_CHANGED, &payload);
}

/// Broadcast the degraded flag to both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_admin_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
