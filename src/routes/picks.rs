use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        pick::{CreatePickRequest, PickQuery, PickSummary},
        week::{WeekRequest, WeekStatusResponse},
    },
    error::AppError,
    routes::identity::CurrentUser,
    services::{pick_service, week_service},
    state::SharedState,
};

/// Weekly pick endpoints for the calling user.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/picks",
            get(list_picks).post(create_pick).delete(delete_pick),
        )
        .route("/weeks/{season}/{week}/status", get(week_status))
}

/// List the caller's picks, newest week first.
#[utoipa::path(
    get,
    path = "/picks",
    tag = "picks",
    params(("X-User-Id" = String, Header, description = "Authenticated user id"), PickQuery),
    responses((status = 200, description = "Picks of the caller", body = [PickSummary]))
)]
pub async fn list_picks(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<PickQuery>,
) -> Result<Json<Vec<PickSummary>>, AppError> {
    Ok(Json(pick_service::list_picks(&state, user_id, query).await?))
}

/// Pick a running back for a week.
#[utoipa::path(
    post,
    path = "/picks",
    tag = "picks",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    request_body = CreatePickRequest,
    responses(
        (status = 200, description = "Pick created", body = PickSummary),
        (status = 404, description = "Unknown running back"),
        (status = 409, description = "Week finalized, player locked or pick already made")
    )
)]
pub async fn create_pick(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Valid(Json(payload)): Valid<Json<CreatePickRequest>>,
) -> Result<Json<PickSummary>, AppError> {
    Ok(Json(pick_service::create_pick(&state, user_id, payload).await?))
}

/// Withdraw the caller's pick for a week while the player is still open.
#[utoipa::path(
    delete,
    path = "/picks",
    tag = "picks",
    params(("X-User-Id" = String, Header, description = "Authenticated user id"), WeekRequest),
    responses(
        (status = 200, description = "Pick removed", body = PickSummary),
        (status = 404, description = "No pick for that week"),
        (status = 409, description = "Week finalized or player locked")
    )
)]
pub async fn delete_pick(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Valid(Query(week)): Valid<Query<WeekRequest>>,
) -> Result<Json<PickSummary>, AppError> {
    Ok(Json(
        pick_service::delete_pick(&state, user_id, week.into()).await?,
    ))
}

/// Whether a week is still open or already finalized.
#[utoipa::path(
    get,
    path = "/weeks/{season}/{week}/status",
    tag = "picks",
    params(
        ("season" = u16, Path, description = "NFL season"),
        ("week" = u8, Path, description = "Regular season week, 1 to 18")
    ),
    responses((status = 200, description = "Week status", body = WeekStatusResponse))
)]
pub async fn week_status(
    State(state): State<SharedState>,
    Valid(Path(week)): Valid<Path<WeekRequest>>,
) -> Result<Json<WeekStatusResponse>, AppError> {
    Ok(Json(week_service::week_status(&state, week.into()).await?))
}
