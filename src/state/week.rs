//! Week identity and the one-way finalization flag.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Month, OffsetDateTime};
use utoipa::ToSchema;

use super::lock::PlayerLock;

/// Last week of the regular season.
pub const MAX_WEEK: u8 = 18;

/// Identifies one NFL week of one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct WeekKey {
    /// Season year.
    pub season: u16,
    /// Week number, 1 to 18.
    pub week: u8,
}

impl WeekKey {
    /// Key for `season` and `week`.
    pub fn new(season: u16, week: u8) -> Self {
        Self { season, week }
    }

    /// Best-effort current NFL week.
    ///
    /// The season starts in September; January through August belong to the
    /// previous season. Weeks are counted from September 7th and clamped to
    /// the regular season range.
    pub fn current(now: OffsetDateTime) -> Self {
        let year = now.year();
        let season_year = if now.month() >= Month::September {
            year
        } else {
            year - 1
        };

        let week = match Date::from_calendar_date(season_year, Month::September, 7) {
            Ok(start) => {
                let elapsed = (now.date() - start).whole_days();
                let raw = elapsed.div_euclid(7) + 1;
                raw.clamp(1, MAX_WEEK as i64) as u8
            }
            Err(_) => 1,
        };

        Self {
            season: u16::try_from(season_year).unwrap_or(u16::MAX),
            week,
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} week {}", self.season, self.week)
    }
}

/// Lifecycle of a week. There is no transition out of `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeekStatus {
    /// Picks may still change.
    Active,
    /// Settled; picks are frozen.
    Finalized {
        /// Settlement time.
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
}

/// Rejections raised by the week state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekError {
    /// Finalization was requested twice.
    #[error("{0} has already been finalized")]
    AlreadyFinalized(WeekKey),
    /// A pick change hit a settled week.
    #[error("{0} is finalized; picks can no longer change")]
    Finalized(WeekKey),
    /// A pick change hit a locked player.
    #[error("player is locked for {0}")]
    PlayerLocked(WeekKey),
}

impl WeekStatus {
    /// Whether the week is settled.
    pub fn is_finalized(&self) -> bool {
        matches!(self, WeekStatus::Finalized { .. })
    }

    /// Move an active week to finalized.
    pub fn finalize(self, key: WeekKey, at: OffsetDateTime) -> Result<WeekStatus, WeekError> {
        match self {
            WeekStatus::Active => Ok(WeekStatus::Finalized { at }),
            WeekStatus::Finalized { .. } => Err(WeekError::AlreadyFinalized(key)),
        }
    }

    /// Reject with [`WeekError::Finalized`] once the week is settled.
    pub fn ensure_open(&self, key: WeekKey) -> Result<(), WeekError> {
        if self.is_finalized() {
            Err(WeekError::Finalized(key))
        } else {
            Ok(())
        }
    }

    /// Gate a pick creation or deletion. Finalization wins over the player lock.
    pub fn check_pick_mutation(&self, key: WeekKey, lock: PlayerLock) -> Result<(), WeekError> {
        self.ensure_open(key)?;
        if lock.is_locked() {
            return Err(WeekError::PlayerLocked(key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn current_week_counts_from_september_seventh() {
        assert_eq!(
            WeekKey::current(datetime!(2024-09-07 12:00 UTC)),
            WeekKey::new(2024, 1)
        );
        assert_eq!(
            WeekKey::current(datetime!(2024-09-14 12:00 UTC)),
            WeekKey::new(2024, 2)
        );
        assert_eq!(
            WeekKey::current(datetime!(2024-09-01 12:00 UTC)),
            WeekKey::new(2024, 1)
        );
    }

    #[test]
    fn january_belongs_to_previous_season() {
        assert_eq!(
            WeekKey::current(datetime!(2025-01-03 12:00 UTC)),
            WeekKey::new(2024, 17)
        );
        assert_eq!(
            WeekKey::current(datetime!(2025-01-10 12:00 UTC)),
            WeekKey::new(2024, 18)
        );
        assert_eq!(
            WeekKey::current(datetime!(2025-06-01 12:00 UTC)),
            WeekKey::new(2024, 18)
        );
    }

    #[test]
    fn finalize_is_one_way() {
        let key = WeekKey::new(2024, 3);
        let at = datetime!(2024-09-24 10:00 UTC);
        let status = WeekStatus::Active.finalize(key, at).unwrap();
        assert!(status.is_finalized());
        assert_eq!(
            status.finalize(key, at).unwrap_err(),
            WeekError::AlreadyFinalized(key)
        );
    }

    #[test]
    fn finalized_week_rejects_pick_even_when_player_open() {
        let key = WeekKey::new(2024, 3);
        let status = WeekStatus::Finalized {
            at: datetime!(2024-09-24 10:00 UTC),
        };
        assert_eq!(
            status.check_pick_mutation(key, PlayerLock::Open),
            Err(WeekError::Finalized(key))
        );
        assert_eq!(
            status.check_pick_mutation(key, PlayerLock::Locked),
            Err(WeekError::Finalized(key))
        );
    }

    #[test]
    fn active_week_gates_on_player_lock() {
        let key = WeekKey::new(2024, 3);
        assert!(WeekStatus::Active.check_pick_mutation(key, PlayerLock::Open).is_ok());
        assert_eq!(
            WeekStatus::Active.check_pick_mutation(key, PlayerLock::Locked),
            Err(WeekError::PlayerLocked(key))
        );
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(WeekStatus::Active).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "active" }));
    }
}
