use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        ingestion::{AutomatedStatusResponse, LiveRushersResponse, RunningBackList, RunningBackQuery},
        week::WeekRequest,
    },
    error::AppError,
    services::ingestion_service,
    state::SharedState,
};

/// Read-only views over running backs and live games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/running-backs", get(search_running_backs))
        .route("/live/rushers", get(live_rushers))
        .route("/automated-updates/status", get(automated_status))
}

/// Running backs of a week, optionally filtered by name or team.
#[utoipa::path(
    get,
    path = "/running-backs",
    tag = "running-backs",
    params(RunningBackQuery),
    responses((status = 200, description = "Matching running backs", body = RunningBackList))
)]
pub async fn search_running_backs(
    State(state): State<SharedState>,
    Query(query): Query<RunningBackQuery>,
) -> Result<Json<RunningBackList>, AppError> {
    Ok(Json(
        ingestion_service::search_running_backs(&state, query).await?,
    ))
}

/// Rushing lines of the week's started games, read from the provider.
#[utoipa::path(
    get,
    path = "/live/rushers",
    tag = "running-backs",
    params(WeekRequest),
    responses(
        (status = 200, description = "Live rushing lines", body = LiveRushersResponse),
        (status = 429, description = "Provider rate limit reached"),
        (status = 502, description = "Provider failure")
    )
)]
pub async fn live_rushers(
    State(state): State<SharedState>,
    Valid(Query(week)): Valid<Query<WeekRequest>>,
) -> Result<Json<LiveRushersResponse>, AppError> {
    Ok(Json(
        ingestion_service::live_rushers(&state, week.into()).await?,
    ))
}

/// Whether games are live and when the next one kicks off.
#[utoipa::path(
    get,
    path = "/automated-updates/status",
    tag = "running-backs",
    params(WeekRequest),
    responses((status = 200, description = "Automated update status", body = AutomatedStatusResponse))
)]
pub async fn automated_status(
    State(state): State<SharedState>,
    Valid(Query(week)): Valid<Query<WeekRequest>>,
) -> Result<Json<AutomatedStatusResponse>, AppError> {
    Ok(Json(
        ingestion_service::automated_status(&state, week.into()).await?,
    ))
}
