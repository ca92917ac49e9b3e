use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        ingestion::{RunningBackList, ScheduleSyncResponse, UpdateYardsRequest, YardsUpdateReport},
        playoffs::{
            BulkImportReport, BulkPlayersRequest, BulkTeamsRequest, CreateFantasyPlayerRequest,
            FantasyPlayerSummary, UpdateFantasyPlayerRequest,
        },
        running_back::{
            ManualEntriesReport, ManualEntriesRequest, ManualEntryKey, RunningBackCacheReport,
        },
        week::{FinalizeWeekResponse, LockRefreshResponse, WeekRequest},
    },
    error::AppError,
    provider::QueueStatus,
    services::{
        ingestion_service, lock_service, playoffs_service, running_back_service, team_import,
        week_service,
    },
    state::{SharedState, week::WeekKey},
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints driving ingestion, locks, finalization and the playoffs pool.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/weeks/finalize", post(finalize_week))
        .route("/admin/locks/refresh", post(refresh_locks))
        .route("/admin/yards/update", post(update_yards))
        .route("/admin/yards/rate-limited", post(rate_limited_update))
        .route("/admin/schedule/sync", post(sync_schedule))
        .route("/admin/provider/status", get(provider_status))
        .route("/admin/running-backs/cache", post(cache_running_backs))
        .route(
            "/admin/running-backs/manual",
            get(list_manual_entries)
                .post(upsert_manual_entries)
                .delete(delete_manual_entry),
        )
        .route("/admin/playoffs/players", post(create_player))
        .route("/admin/playoffs/players/{id}", put(update_player))
        .route("/admin/playoffs/players/bulk", post(bulk_import_players))
        .route("/admin/playoffs/teams/bulk", post(bulk_import_teams))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Settle a week: final yards, profile totals and the finalized flag.
#[utoipa::path(
    post,
    path = "/admin/weeks/finalize",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = WeekRequest,
    responses(
        (status = 200, description = "Week finalized", body = FinalizeWeekResponse),
        (status = 409, description = "Week already finalized")
    )
)]
pub async fn finalize_week(
    State(state): State<SharedState>,
    Valid(Json(week)): Valid<Json<WeekRequest>>,
) -> Result<Json<FinalizeWeekResponse>, AppError> {
    Ok(Json(week_service::finalize_week(&state, week.into()).await?))
}

/// Lock every player whose game has kicked off or is about to.
#[utoipa::path(
    post,
    path = "/admin/locks/refresh",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = WeekRequest,
    responses((status = 200, description = "Locks refreshed", body = LockRefreshResponse))
)]
pub async fn refresh_locks(
    State(state): State<SharedState>,
    Valid(Json(week)): Valid<Json<WeekRequest>>,
) -> Result<Json<LockRefreshResponse>, AppError> {
    Ok(Json(lock_service::refresh_locks(&state, week.into()).await?))
}

/// Refresh yards for one player, or every running back of the week.
#[utoipa::path(
    post,
    path = "/admin/yards/update",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = UpdateYardsRequest,
    responses(
        (status = 200, description = "Yards refreshed", body = YardsUpdateReport),
        (status = 404, description = "Unknown running back"),
        (status = 429, description = "Provider rate limit reached")
    )
)]
pub async fn update_yards(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateYardsRequest>>,
) -> Result<Json<YardsUpdateReport>, AppError> {
    let key = WeekKey::new(payload.season, payload.week);
    Ok(Json(
        ingestion_service::update_yards(&state, key, payload.player_id.as_deref()).await?,
    ))
}

/// Refresh picked players only, backing off near the provider cap.
#[utoipa::path(
    post,
    path = "/admin/yards/rate-limited",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = UpdateYardsRequest,
    responses(
        (status = 200, description = "Yards refreshed", body = YardsUpdateReport),
        (status = 429, description = "Rate limit approaching, retry later")
    )
)]
pub async fn rate_limited_update(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateYardsRequest>>,
) -> Result<Json<YardsUpdateReport>, AppError> {
    let key = WeekKey::new(payload.season, payload.week);
    Ok(Json(
        ingestion_service::rate_limited_update(&state, key, payload.player_id.as_deref()).await?,
    ))
}

/// Store the week's schedule and stamp running backs with their games.
#[utoipa::path(
    post,
    path = "/admin/schedule/sync",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = WeekRequest,
    responses((status = 200, description = "Schedule stored", body = ScheduleSyncResponse))
)]
pub async fn sync_schedule(
    State(state): State<SharedState>,
    Valid(Json(week)): Valid<Json<WeekRequest>>,
) -> Result<Json<ScheduleSyncResponse>, AppError> {
    Ok(Json(ingestion_service::sync_schedule(&state, week.into()).await?))
}

/// Provider request budget as seen by the queue.
#[utoipa::path(
    get,
    path = "/admin/provider/status",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Queue status", body = QueueStatus))
)]
pub async fn provider_status(State(state): State<SharedState>) -> Json<QueueStatus> {
    Json(ingestion_service::provider_status(&state))
}

/// Cache the week's running backs from the rosters of every scheduled team.
#[utoipa::path(
    post,
    path = "/admin/running-backs/cache",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = WeekRequest,
    responses(
        (status = 200, description = "Running backs cached", body = RunningBackCacheReport),
        (status = 502, description = "Schedule could not be read")
    )
)]
pub async fn cache_running_backs(
    State(state): State<SharedState>,
    Valid(Json(week)): Valid<Json<WeekRequest>>,
) -> Result<Json<RunningBackCacheReport>, AppError> {
    Ok(Json(
        running_back_service::cache_running_backs(&state, week.into()).await?,
    ))
}

/// List the manual running back lines of a week.
#[utoipa::path(
    get,
    path = "/admin/running-backs/manual",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"), WeekRequest),
    responses((status = 200, description = "Manual lines, most yards first", body = RunningBackList))
)]
pub async fn list_manual_entries(
    State(state): State<SharedState>,
    Valid(Query(week)): Valid<Query<WeekRequest>>,
) -> Result<Json<RunningBackList>, AppError> {
    Ok(Json(
        running_back_service::list_manual_entries(&state, week.into()).await?,
    ))
}

/// Add or overwrite running back lines by hand, one or a whole week at once.
#[utoipa::path(
    post,
    path = "/admin/running-backs/manual",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = ManualEntriesRequest,
    responses(
        (status = 200, description = "Lines stored", body = ManualEntriesReport),
        (status = 409, description = "Week already finalized")
    )
)]
pub async fn upsert_manual_entries(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ManualEntriesRequest>>,
) -> Result<Json<ManualEntriesReport>, AppError> {
    Ok(Json(
        running_back_service::upsert_manual_entries(&state, payload).await?,
    ))
}

/// Remove a manual line nobody has picked.
#[utoipa::path(
    delete,
    path = "/admin/running-backs/manual",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"), ManualEntryKey),
    responses(
        (status = 204, description = "Manual line removed"),
        (status = 404, description = "Unknown running back"),
        (status = 409, description = "Line is cached from the provider or already picked")
    )
)]
pub async fn delete_manual_entry(
    State(state): State<SharedState>,
    Valid(Query(entry)): Valid<Query<ManualEntryKey>>,
) -> Result<StatusCode, AppError> {
    running_back_service::delete_manual_entry(&state, entry).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a playoff player.
#[utoipa::path(
    post,
    path = "/admin/playoffs/players",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreateFantasyPlayerRequest,
    responses((status = 200, description = "Player created", body = FantasyPlayerSummary))
)]
pub async fn create_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateFantasyPlayerRequest>>,
) -> Result<Json<FantasyPlayerSummary>, AppError> {
    Ok(Json(playoffs_service::create_player(&state, payload).await?))
}

/// Edit a playoff player.
#[utoipa::path(
    put,
    path = "/admin/playoffs/players/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Player identifier")),
    request_body = UpdateFantasyPlayerRequest,
    responses(
        (status = 200, description = "Player updated", body = FantasyPlayerSummary),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateFantasyPlayerRequest>>,
) -> Result<Json<FantasyPlayerSummary>, AppError> {
    Ok(Json(
        playoffs_service::update_player(&state, id, payload).await?,
    ))
}

/// Import players from spreadsheet rows.
#[utoipa::path(
    post,
    path = "/admin/playoffs/players/bulk",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = BulkPlayersRequest,
    responses(
        (status = 200, description = "Import report", body = BulkImportReport),
        (status = 400, description = "A row could not be read")
    )
)]
pub async fn bulk_import_players(
    State(state): State<SharedState>,
    Json(payload): Json<BulkPlayersRequest>,
) -> Result<Json<BulkImportReport>, AppError> {
    Ok(Json(
        playoffs_service::bulk_import_players(&state, payload).await?,
    ))
}

/// Import pre-drafted teams listed by player name.
#[utoipa::path(
    post,
    path = "/admin/playoffs/teams/bulk",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = BulkTeamsRequest,
    responses((status = 200, description = "Import report", body = BulkImportReport))
)]
pub async fn bulk_import_teams(
    State(state): State<SharedState>,
    Json(payload): Json<BulkTeamsRequest>,
) -> Result<Json<BulkImportReport>, AppError> {
    Ok(Json(team_import::bulk_import_teams(&state, payload).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not connected".into(),
        )),
    }
}
