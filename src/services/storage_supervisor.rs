use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{pickem_store::PickemStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PickemStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_store(&state, store.as_ref()).await;

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll an installed store until reconnect attempts are exhausted.
async fn watch_store(state: &SharedState, store: &dyn PickemStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        let mut reconnect_delay = INITIAL_DELAY;
        let mut reconnected = false;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            match store.try_reconnect().await {
                Ok(()) => {
                    info!(attempt, "storage reconnection succeeded after health check failure");
                    reconnected = true;
                    break;
                }
                Err(err) => {
                    if attempt == 0 {
                        warn!(
                            attempt, error = %err,
                            "storage reconnect first attempt failed; entering degraded mode"
                        );
                        state.update_degraded(true);
                    } else {
                        warn!(attempt, error = %err, "storage reconnect attempt failed");
                    }
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                }
            }
        }

        if !reconnected {
            warn!("exhausted storage reconnect attempts; staying in degraded mode");
            return;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::atomic::{AtomicU32, Ordering},
    };

    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::pickem_store::memory::MemoryStore,
        provider::{RateLimitConfig, RequestQueue, fake::FakeProvider},
        state::{AppState, clock::ManualClock},
    };

    #[tokio::test(start_paused = true)]
    async fn leaves_degraded_mode_after_connect_succeeds() {
        let state = AppState::new(
            AppConfig::default(),
            RequestQueue::new(RateLimitConfig::default()),
            Arc::new(FakeProvider::default()),
            Arc::new(ManualClock::new(datetime!(2024-09-10 12:00 UTC))),
        );
        assert!(state.is_degraded());

        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        tokio::spawn(run(state.clone(), move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(StorageError::unavailable(
                        "connect refused".into(),
                        io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(MemoryStore::new()) as Arc<dyn PickemStore>)
                }
            }
        }));

        sleep(Duration::from_millis(500)).await;
        assert!(state.is_degraded());

        // 1s + 2s of backoff before the third attempt
        sleep(Duration::from_secs(3)).await;
        assert!(!state.is_degraded());
        assert!(state.store().await.is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
