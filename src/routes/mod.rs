use axum::Router;

use crate::state::SharedState;

/// Operator endpoints behind the admin token.
pub mod admin;
/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Caller identity extractor.
pub mod identity;
/// Standings.
pub mod leaderboard;
/// Weekly picks and week status.
pub mod picks;
/// Playoffs player pool and teams.
pub mod playoffs;
/// Participant profiles.
pub mod profile;
/// Running back search and live rushing.
pub mod running_backs;
/// Server-sent event streams.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(picks::router())
        .merge(profile::router())
        .merge(leaderboard::router())
        .merge(running_backs::router())
        .merge(playoffs::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router());

    api_router.with_state(state)
}
