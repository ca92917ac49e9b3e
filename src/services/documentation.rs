use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the pick'em backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::picks::list_picks,
        crate::routes::picks::create_pick,
        crate::routes::picks::delete_pick,
        crate::routes::picks::week_status,
        crate::routes::profile::get_profile,
        crate::routes::profile::update_profile,
        crate::routes::profile::reset_season,
        crate::routes::leaderboard::leaderboard,
        crate::routes::leaderboard::playoffs_leaderboard,
        crate::routes::running_backs::search_running_backs,
        crate::routes::running_backs::live_rushers,
        crate::routes::running_backs::automated_status,
        crate::routes::playoffs::list_players,
        crate::routes::playoffs::list_teams,
        crate::routes::playoffs::get_team,
        crate::routes::playoffs::create_team,
        crate::routes::playoffs::update_team,
        crate::routes::playoffs::delete_team,
        crate::routes::admin::finalize_week,
        crate::routes::admin::refresh_locks,
        crate::routes::admin::update_yards,
        crate::routes::admin::rate_limited_update,
        crate::routes::admin::sync_schedule,
        crate::routes::admin::provider_status,
        crate::routes::admin::cache_running_backs,
        crate::routes::admin::list_manual_entries,
        crate::routes::admin::upsert_manual_entries,
        crate::routes::admin::delete_manual_entry,
        crate::routes::admin::create_player,
        crate::routes::admin::update_player,
        crate::routes::admin::bulk_import_players,
        crate::routes::admin::bulk_import_teams,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::Handshake,
            crate::dto::sse::LocksRefreshedEvent,
            crate::dto::sse::YardsUpdatedEvent,
            crate::dto::sse::WeekFinalizedEvent,
            crate::dto::pick::PickSummary,
            crate::dto::pick::CreatePickRequest,
            crate::dto::pick::ResetSeasonResponse,
            crate::dto::week::WeekRequest,
            crate::dto::week::WeekStatusResponse,
            crate::dto::week::LockRefreshResponse,
            crate::dto::week::FinalizeWeekResponse,
            crate::dto::profile::ProfileSummary,
            crate::dto::profile::UpdateProfileRequest,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::PlayoffsLeaderboardEntry,
            crate::dto::ingestion::UpdateYardsRequest,
            crate::dto::ingestion::YardsUpdateReport,
            crate::dto::ingestion::ScheduleSyncResponse,
            crate::dto::ingestion::AutomatedStatusResponse,
            crate::dto::ingestion::RunningBackList,
            crate::dto::ingestion::LiveRushersResponse,
            crate::dto::running_back::RunningBackCacheReport,
            crate::dto::running_back::ManualRunningBack,
            crate::dto::running_back::ManualEntriesRequest,
            crate::dto::running_back::ManualEntriesReport,
            crate::dto::playoffs::FantasyPlayerSummary,
            crate::dto::playoffs::CreateFantasyPlayerRequest,
            crate::dto::playoffs::UpdateFantasyPlayerRequest,
            crate::dto::playoffs::BulkPlayersRequest,
            crate::dto::playoffs::BulkTeamsRequest,
            crate::dto::playoffs::BulkImportReport,
            crate::dto::playoffs::CreateFantasyTeamRequest,
            crate::dto::playoffs::UpdateFantasyTeamRequest,
            crate::dto::playoffs::FantasyTeamSummary,
            crate::provider::QueueStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "picks", description = "Weekly running back picks"),
        (name = "profile", description = "Participant profiles"),
        (name = "leaderboard", description = "Season standings"),
        (name = "running-backs", description = "Running backs and live rushing lines"),
        (name = "playoffs", description = "Playoffs fantasy mode"),
        (name = "admin", description = "Operator endpoints behind the admin token"),
    )
)]
pub struct ApiDoc;
