use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::sse::{AdminHandshake, Handshake, ServerEvent},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_ADMIN_TOKEN: &str = "admin_token";

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the admin-only SSE stream, claiming the admin token.
pub async fn subscribe_admin(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_admin_token(state).await?;
    let receiver = state.admin_sse().subscribe();
    Ok((receiver, token))
}

/// Identifies the target SSE stream so teardown can release the admin token.
#[derive(Clone)]
pub enum StreamKind {
    /// Anonymous public stream.
    Public,
    /// Admin stream; its token is released on disconnect.
    Admin(SharedState),
}

/// Convert a broadcast receiver into an SSE response. `greeting` is sent
/// first, ahead of any broadcast event.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    greeting: Option<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(greeting) = greeting {
            if tx.send(Ok(to_event(greeting))).await.is_err() {
                release(kind).await;
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "SSE subscriber lagged; skipping events");
                            continue;
                        }
                    }
                }
            }
        }

        release(kind).await;
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Greeting for a new public subscriber.
pub fn public_handshake(state: &SharedState) -> Option<ServerEvent> {
    ServerEvent::json(
        Some(EVENT_HANDSHAKE.to_string()),
        &Handshake {
            stream: "public".into(),
            message: "public stream connected".into(),
            degraded: state.is_degraded(),
        },
    )
    .ok()
}

/// Greeting carrying the admin token to the admin subscriber.
pub fn admin_handshake(token: &str) -> Option<ServerEvent> {
    ServerEvent::json(
        Some(EVENT_ADMIN_TOKEN.to_string()),
        &AdminHandshake {
            token: token.to_string(),
        },
    )
    .ok()
}

/// Forward degraded mode changes to both SSE streams until the state is dropped.
pub async fn run_status_forwarder(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        sse_events::broadcast_system_status(&state, degraded);
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

async fn release(kind: StreamKind) {
    match kind {
        StreamKind::Public => info!("public SSE stream disconnected"),
        StreamKind::Admin(state) => {
            reset_admin_token(&state).await;
            info!("admin SSE stream disconnected")
        }
    }
}

/// Reserve the admin token for a new stream, failing if another connection holds it.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "Another admin SSE stream is already active".into(),
        )),
    }
}

async fn reset_admin_token(state: &SharedState) {
    let mut guard = state.admin_token().lock().await;
    guard.take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{provider::fake::FakeProvider, state::test_support::harness};
    use time::macros::datetime;

    #[tokio::test]
    async fn only_one_admin_stream_at_a_time() {
        let h = harness(FakeProvider::default(), datetime!(2024-09-10 12:00 UTC)).await;
        let (_rx, token) = subscribe_admin(&h.state).await.unwrap();
        assert_eq!(token.len(), 32);
        assert!(matches!(
            subscribe_admin(&h.state).await,
            Err(ServiceError::Unauthorized(_))
        ));

        reset_admin_token(&h.state).await;
        assert!(subscribe_admin(&h.state).await.is_ok());
    }

    #[tokio::test]
    async fn public_handshake_reports_degraded_flag() {
        let h = harness(FakeProvider::default(), datetime!(2024-09-10 12:00 UTC)).await;
        let greeting = public_handshake(&h.state).unwrap();
        assert_eq!(greeting.event.as_deref(), Some("handshake"));
        assert!(greeting.data.contains("\"degraded\":false"));
    }
}
