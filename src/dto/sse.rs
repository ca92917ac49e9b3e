use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl ServerEvent {
    /// Raw text payload, optionally named.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `admin`).
    pub stream: String,
    /// Greeting text.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Token handed to the admin stream; required in `X-Admin-Token` on admin routes.
pub struct AdminHandshake {
    /// Token value.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// `true` while storage is unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a lock sweep changed at least one player.
pub struct LocksRefreshedEvent {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Players locked by this sweep.
    pub newly_locked: Vec<String>,
    /// Players whose lock could not be written.
    pub failures: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a running back's yards were refreshed.
pub struct YardsUpdatedEvent {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Player refreshed.
    pub player_id: String,
    /// New yards.
    pub yards: i64,
    /// Open picks moved.
    pub picks_updated: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once a week has been settled.
pub struct WeekFinalizedEvent {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Settlement time.
    #[serde(with = "time::serde::rfc3339")]
    pub finalized_at: OffsetDateTime,
    /// Picks frozen.
    pub picks_settled: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Hint that profile totals moved and leaderboards should be refetched.
pub struct LeaderboardChangedEvent {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
}
