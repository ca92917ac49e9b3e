/// Wall-clock abstraction.
pub mod clock;
/// Player lock rules.
pub mod lock;
/// Playoff roster slots and validation.
pub mod roster;
/// Playoff fantasy scoring.
pub mod scoring;
mod sse;
/// Week identity and finalization.
pub mod week;

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::pickem_store::PickemStore,
    error::ServiceError,
    provider::{RequestQueue, StatsProvider},
};

pub use self::sse::SseHub;
use self::{clock::Clock, sse::SseState};

/// Handle shared by every handler and background task.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, provider access and SSE hubs.
pub struct AppState {
    store: RwLock<Option<Arc<dyn PickemStore>>>,
    degraded: watch::Sender<bool>,
    sse: SseState,
    provider: Arc<dyn StatsProvider>,
    queue: RequestQueue,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    settle_gate: RwLock<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        queue: RequestQueue,
        provider: Arc<dyn StatsProvider>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            sse: SseState::new(32, 16),
            provider,
            queue,
            config,
            clock,
            settle_gate: RwLock::new(()),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn PickemStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn PickemStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn PickemStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin().hub()
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.admin().token()
    }

    /// Statistics provider client.
    pub fn provider(&self) -> &Arc<dyn StatsProvider> {
        &self.provider
    }

    /// Handle on the outbound provider queue, used for status reads.
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current time from the configured clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Week settlement gate.
    ///
    /// Finalization takes the write side. Pick mutations hold the read side from
    /// their week check to their write, so no pick lands in a week that settles
    /// in between.
    pub fn settle_gate(&self) -> &RwLock<()> {
        &self.settle_gate
    }
}

#[cfg(test)]
pub mod test_support {
    //! Shared fixtures for service tests.

    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::{AppState, SharedState, clock::ManualClock};
    use crate::{
        config::AppConfig,
        dao::pickem_store::memory::MemoryStore,
        provider::{RateLimitConfig, RequestQueue, fake::FakeProvider},
    };

    pub struct Harness {
        pub state: SharedState,
        pub store: MemoryStore,
        pub provider: FakeProvider,
        pub clock: Arc<ManualClock>,
    }

    pub async fn harness(provider: FakeProvider, now: OffsetDateTime) -> Harness {
        harness_with_config(provider, now, AppConfig::default()).await
    }

    pub async fn harness_with_config(
        provider: FakeProvider,
        now: OffsetDateTime,
        config: AppConfig,
    ) -> Harness {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(now));
        let state = AppState::new(
            config,
            RequestQueue::new(RateLimitConfig::default()),
            Arc::new(provider.clone()),
            clock.clone(),
        );
        state.set_store(Arc::new(store.clone())).await;
        Harness {
            state,
            store,
            provider,
            clock,
        }
    }
}
