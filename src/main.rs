//! Rushing pick'em backend entrypoint wiring REST, SSE, storage and the statistics provider.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickem_back::{
    config::AppConfig,
    dao::pickem_store::{PickemStore, memory::MemoryStore},
    provider::{
        API_KEY_ENV, RequestQueue, SportradarClient, SportradarConfig, StatsProvider,
        UnconfiguredProvider,
    },
    routes,
    services::{lock_service, sse_service, storage_supervisor},
    state::{AppState, SharedState, clock::SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let queue = RequestQueue::new(config.rate_limit);
    let provider = build_provider(queue.clone());
    let app_state = AppState::new(config, queue, provider, Arc::new(SystemClock));

    spawn_storage_supervisor(app_state.clone());
    tokio::spawn(sse_service::run_status_forwarder(app_state.clone()));
    tokio::spawn(lock_service::run_lock_sweeper(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Sportradar client when an API key is set; otherwise every provider call fails cleanly.
fn build_provider(queue: RequestQueue) -> Arc<dyn StatsProvider> {
    let client = SportradarConfig::from_env()
        .and_then(|config| SportradarClient::new(config, queue));
    match client {
        Ok(client) => {
            info!("statistics provider configured");
            Arc::new(client)
        }
        Err(err) => {
            warn!(error = %err, "statistics provider disabled; ingestion endpoints will fail");
            Arc::new(UnconfiguredProvider::new(API_KEY_ENV))
        }
    }
}

/// Start the storage supervisor with PostgREST when configured, the in-memory store otherwise.
fn spawn_storage_supervisor(state: SharedState) {
    #[cfg(feature = "postgrest-store")]
    {
        use pickem_back::dao::{
            pickem_store::postgrest::{PostgrestConfig, PostgrestStore},
            storage::StorageError,
        };

        match PostgrestConfig::from_env() {
            Ok(config) => {
                info!(url = %config.base_url, "using PostgREST storage");
                tokio::spawn(storage_supervisor::run(state, move || {
                    let config = config.clone();
                    async move {
                        PostgrestStore::connect(config)
                            .await
                            .map(|store| Arc::new(store) as Arc<dyn PickemStore>)
                            .map_err(StorageError::from)
                    }
                }));
                return;
            }
            Err(err) => warn!(error = %err, "PostgREST not configured; using in-memory storage"),
        }
    }

    tokio::spawn(storage_supervisor::run(state, || async {
        Ok(Arc::new(MemoryStore::new()) as Arc<dyn PickemStore>)
    }));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "could not install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
