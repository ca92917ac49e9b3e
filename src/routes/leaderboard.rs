use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::leaderboard::{LeaderboardResponse, PlayoffsLeaderboardEntry},
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Pick'em standings routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/playoffs/leaderboard", get(playoffs_leaderboard))
}

/// Season standings by total rushing yards.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Season standings", body = LeaderboardResponse))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::leaderboard(&state).await?))
}

/// Playoff fantasy teams by points.
#[utoipa::path(
    get,
    path = "/playoffs/leaderboard",
    tag = "playoffs",
    responses((status = 200, description = "Playoff standings", body = [PlayoffsLeaderboardEntry]))
)]
pub async fn playoffs_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayoffsLeaderboardEntry>>, AppError> {
    Ok(Json(leaderboard_service::playoffs_leaderboard(&state).await?))
}
