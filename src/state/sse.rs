use tokio::sync::{Mutex, broadcast};
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Public and admin SSE hubs held by [`super::AppState`].
pub struct SseState {
    public: SseHub,
    admin: AdminSseState,
}

impl SseState {
    /// Hubs with the given channel capacities.
    pub fn new(public_capacity: usize, admin_capacity: usize) -> Self {
        Self {
            public: SseHub::new("public", public_capacity),
            admin: AdminSseState {
                hub: SseHub::new("admin", admin_capacity),
                token: Mutex::new(None),
            },
        }
    }

    /// Hub of the public stream.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Admin hub and its token.
    pub fn admin(&self) -> &AdminSseState {
        &self.admin
    }
}

/// Admin hub plus the token handed to its single subscriber.
pub struct AdminSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl AdminSseState {
    /// Hub of the admin stream.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Token of the connected admin stream, `None` when nobody is connected.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Named broadcast channel fanning events out to SSE subscribers.
pub struct SseHub {
    name: &'static str,
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Named hub buffering up to `capacity` events per subscriber.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { name, sender }
    }

    /// Receiver for events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Number of connected subscribers.
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send an event to all current subscribers; events sent with nobody listening are dropped.
    pub fn broadcast(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            trace!(hub = self.name, "no SSE subscribers; event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_broadcasts() {
        let hub = SseHub::new("public", 4);
        let mut receiver = hub.subscribe();
        assert_eq!(hub.subscribers(), 1);

        hub.broadcast(ServerEvent::new(Some("info".into()), "hello".into()));
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("info"));
        assert_eq!(event.data, "hello");
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        let hub = SseHub::new("admin", 4);
        hub.broadcast(ServerEvent::new(None, "ignored".into()));
        assert_eq!(hub.subscribers(), 0);
    }
}
