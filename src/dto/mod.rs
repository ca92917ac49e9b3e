/// Health check payloads.
pub mod health;
/// Yard ingestion, schedule sync and running back views.
pub mod ingestion;
/// Season and playoffs standings.
pub mod leaderboard;
/// Weekly picks.
pub mod pick;
/// Playoffs player pool and rosters.
pub mod playoffs;
/// Participant profiles.
pub mod profile;
/// Running back pool maintenance.
pub mod running_back;
/// Server-sent event payloads.
pub mod sse;
/// Shared validators.
pub mod validation;
/// Week addressing, status and settlement.
pub mod week;
