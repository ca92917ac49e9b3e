/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Statistics ingestion: yards, schedule sync and live views.
pub mod ingestion_service;
/// Season and playoffs standings.
pub mod leaderboard_service;
/// Player locks and the background lock sweep.
pub mod lock_service;
/// Weekly pick creation, withdrawal and season reset.
pub mod pick_service;
/// Playoffs player pool and user rosters.
pub mod playoffs_service;
/// Participant profiles.
pub mod profile_service;
/// Weekly running back pool: provider cache and manual lines.
pub mod running_back_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Bulk import of pre-drafted playoffs teams.
pub mod team_import;
/// Week status and finalization.
pub mod week_service;
