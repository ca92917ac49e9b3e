//! Player lock state machine.
//!
//! A running back is open for picks until a fixed lead time before the
//! kickoff of their game; after that the lock is permanent for the week.

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;

/// Lead time before kickoff at which a player locks.
pub const DEFAULT_LOCK_LEAD: Duration = Duration::minutes(15);

/// Whether a player may still be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerLock {
    /// Picks allowed.
    Open,
    /// Picks closed for the rest of the week.
    Locked,
}

impl PlayerLock {
    /// Read the persisted `is_locked` flag.
    pub fn from_flag(is_locked: bool) -> Self {
        if is_locked {
            PlayerLock::Locked
        } else {
            PlayerLock::Open
        }
    }

    /// Whether this is [`PlayerLock::Locked`].
    pub fn is_locked(self) -> bool {
        self == PlayerLock::Locked
    }

    /// Combine the persisted state with a freshly evaluated one.
    ///
    /// Locked is absorbing: once a player has been locked, no later
    /// evaluation may reopen them.
    pub fn advance(self, evaluated: PlayerLock) -> PlayerLock {
        match self {
            PlayerLock::Locked => PlayerLock::Locked,
            PlayerLock::Open => evaluated,
        }
    }
}

/// Rule deciding when a player locks relative to kickoff.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    lead: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            lead: DEFAULT_LOCK_LEAD,
        }
    }
}

impl LockPolicy {
    /// Policy locking `lead` before kickoff.
    pub fn new(lead: Duration) -> Self {
        Self { lead }
    }

    /// Configured lead time.
    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// Instant at which a game with the given kickoff locks its players.
    pub fn lock_time(&self, kickoff: OffsetDateTime) -> OffsetDateTime {
        kickoff - self.lead
    }

    /// `true` once `now` has reached the lock time. Unknown kickoff never locks.
    pub fn is_locked(&self, kickoff: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        kickoff.is_some_and(|kickoff| now >= self.lock_time(kickoff))
    }

    /// Lock state implied by the clock alone.
    pub fn evaluate(&self, kickoff: Option<OffsetDateTime>, now: OffsetDateTime) -> PlayerLock {
        PlayerLock::from_flag(self.is_locked(kickoff, now))
    }

    /// Next state for a persisted player, never moving from locked back to open.
    pub fn transition(
        &self,
        current: PlayerLock,
        kickoff: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> PlayerLock {
        current.advance(self.evaluate(kickoff, now))
    }
}
