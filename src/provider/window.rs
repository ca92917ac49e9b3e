use std::{collections::VecDeque, time::Duration};

use tokio::time::Instant;

/// Dispatch timestamps kept in order, oldest first.
#[derive(Debug, Default)]
pub(super) struct RateWindow {
    stamps: VecDeque<Instant>,
}

impl RateWindow {
    /// Stamp a dispatch at `at`; stamps must arrive in order.
    pub(super) fn record(&mut self, at: Instant) {
        self.stamps.push_back(at);
    }

    /// Drop every stamp that is `horizon` or more older than `now`.
    pub(super) fn prune(&mut self, now: Instant, horizon: Duration) {
        while self
            .stamps
            .front()
            .is_some_and(|stamp| now.saturating_duration_since(*stamp) >= horizon)
        {
            self.stamps.pop_front();
        }
    }

    /// Number of stamps younger than `span` at `now`.
    pub(super) fn count_within(&self, now: Instant, span: Duration) -> usize {
        self.stamps
            .iter()
            .rev()
            .take_while(|stamp| now.saturating_duration_since(**stamp) < span)
            .count()
    }

    /// Stamps still held, which is the trailing-hour count once pruned.
    pub(super) fn len(&self) -> usize {
        self.stamps.len()
    }
}
