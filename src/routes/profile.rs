use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        pick::ResetSeasonResponse,
        profile::{ProfileSummary, UpdateProfileRequest},
    },
    error::AppError,
    routes::identity::CurrentUser,
    services::{pick_service, profile_service},
    state::SharedState,
};

/// Profile routes for the authenticated user.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/reset-season", post(reset_season))
}

/// Profile of the caller.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    responses(
        (status = 200, description = "Profile of the caller", body = ProfileSummary),
        (status = 404, description = "No profile yet")
    )
)]
pub async fn get_profile(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ProfileSummary>, AppError> {
    Ok(Json(profile_service::get_profile(&state, user_id).await?))
}

/// Update team name or logo, creating the profile on first use.
#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = ProfileSummary))
)]
pub async fn update_profile(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Valid(Json(payload)): Valid<Json<UpdateProfileRequest>>,
) -> Result<Json<ProfileSummary>, AppError> {
    Ok(Json(
        profile_service::update_profile(&state, user_id, payload).await?,
    ))
}

/// Delete every pick of the caller and zero their yards.
#[utoipa::path(
    post,
    path = "/profile/reset-season",
    tag = "profile",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    responses((status = 200, description = "Season reset", body = ResetSeasonResponse))
)]
pub async fn reset_season(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ResetSeasonResponse>, AppError> {
    Ok(Json(pick_service::reset_season(&state, user_id).await?))
}
