use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::playoffs::{
        CreateFantasyTeamRequest, FantasyPlayerQuery, FantasyPlayerSummary, FantasyTeamQuery,
        FantasyTeamSummary, UpdateFantasyTeamRequest,
    },
    error::AppError,
    routes::identity::CurrentUser,
    services::playoffs_service,
    state::SharedState,
};

/// Player pool and roster endpoints of the playoffs mode.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/playoffs/players", get(list_players))
        .route("/playoffs/teams", get(list_teams).post(create_team))
        .route(
            "/playoffs/teams/{id}",
            get(get_team).put(update_team).delete(delete_team),
        )
}

/// Playoff players, filtered and sorted.
#[utoipa::path(
    get,
    path = "/playoffs/players",
    tag = "playoffs",
    params(FantasyPlayerQuery),
    responses((status = 200, description = "Player pool", body = [FantasyPlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Query(query): Query<FantasyPlayerQuery>,
) -> Result<Json<Vec<FantasyPlayerSummary>>, AppError> {
    Ok(Json(playoffs_service::list_players(&state, query).await?))
}

/// Playoff teams, optionally with rosters and points.
#[utoipa::path(
    get,
    path = "/playoffs/teams",
    tag = "playoffs",
    params(FantasyTeamQuery),
    responses((status = 200, description = "Teams, newest first", body = [FantasyTeamSummary]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Query(query): Query<FantasyTeamQuery>,
) -> Result<Json<Vec<FantasyTeamSummary>>, AppError> {
    Ok(Json(playoffs_service::list_teams(&state, query).await?))
}

/// One team with its roster.
#[utoipa::path(
    get,
    path = "/playoffs/teams/{id}",
    tag = "playoffs",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team with players and rank", body = FantasyTeamSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FantasyTeamSummary>, AppError> {
    Ok(Json(playoffs_service::get_team(&state, id).await?))
}

/// Draft a 17-player roster.
#[utoipa::path(
    post,
    path = "/playoffs/teams",
    tag = "playoffs",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    request_body = CreateFantasyTeamRequest,
    responses(
        (status = 200, description = "Team created", body = FantasyTeamSummary),
        (status = 400, description = "Roster breaks the composition rules"),
        (status = 403, description = "Teams are locked"),
        (status = 409, description = "Team name taken")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Valid(Json(payload)): Valid<Json<CreateFantasyTeamRequest>>,
) -> Result<Json<FantasyTeamSummary>, AppError> {
    Ok(Json(
        playoffs_service::create_team(&state, user_id, payload).await?,
    ))
}

/// Rename a team or replace its roster before the lock.
#[utoipa::path(
    put,
    path = "/playoffs/teams/{id}",
    tag = "playoffs",
    params(
        ("X-User-Id" = String, Header, description = "Authenticated user id"),
        ("id" = Uuid, Path, description = "Team identifier")
    ),
    request_body = UpdateFantasyTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = FantasyTeamSummary),
        (status = 403, description = "Teams are locked"),
        (status = 404, description = "Team not found or not owned by the caller")
    )
)]
pub async fn update_team(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateFantasyTeamRequest>>,
) -> Result<Json<FantasyTeamSummary>, AppError> {
    Ok(Json(
        playoffs_service::update_team(&state, user_id, id, payload).await?,
    ))
}

/// Delete one of the caller's teams before the roster lock.
#[utoipa::path(
    delete,
    path = "/playoffs/teams/{id}",
    tag = "playoffs",
    params(
        ("X-User-Id" = String, Header, description = "Authenticated user id"),
        ("id" = Uuid, Path, description = "Team identifier")
    ),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 403, description = "Teams are locked"),
        (status = 404, description = "Team not found or not owned by the caller")
    )
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    playoffs_service::delete_team(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
