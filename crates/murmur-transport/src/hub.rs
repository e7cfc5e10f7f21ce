//! Connection hub: fan-out of server events to live connections.
//!
//! Each connection registers an unbounded outbox queue; its socket
//! task drains the queue and writes frames. Delivery into a queue is
//! synchronous and never waits on the network, so a broadcast caller
//! is decoupled from every receiver's socket. A queue whose receiver
//! is gone simply drops the event.

use dashmap::DashMap;
use murmur_core::{ConnectionId, EventSink};
use murmur_protocol::ServerEvent;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Receiver half of a connection's outbox.
pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

/// The hub of live connections.
///
/// Cloneless by design: constructed once and shared behind an `Arc`
/// between the server's connection tasks and the coordinator.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    outboxes: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl ConnectionHub {
    /// Create a new, empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning the receiver its socket task
    /// must drain. Re-registering an id replaces the previous outbox.
    pub fn register(&self, connection_id: &ConnectionId) -> Outbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.insert(connection_id.clone(), tx);
        debug!(connection = %connection_id, "Registered connection");
        rx
    }

    /// Remove a connection from the hub.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if self.outboxes.remove(connection_id).is_some() {
            debug!(connection = %connection_id, "Unregistered connection");
        }
    }

    /// Get the number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.outboxes.len()
    }
}

#[async_trait::async_trait]
impl EventSink for ConnectionHub {
    async fn send(&self, target: &ConnectionId, event: ServerEvent) {
        if let Some(outbox) = self.outboxes.get(target) {
            // A closed receiver means the connection is going away;
            // the event is dropped silently.
            let _ = outbox.send(event);
        } else {
            trace!(connection = %target, "Send to unknown connection dropped");
        }
    }

    async fn broadcast_all(&self, event: ServerEvent) {
        trace!(event = event.name(), recipients = self.outboxes.len(), "Broadcast");
        for outbox in self.outboxes.iter() {
            let _ = outbox.value().send(event.clone());
        }
    }

    async fn broadcast_except(&self, excluded: &ConnectionId, event: ServerEvent) {
        for outbox in self.outboxes.iter() {
            if outbox.key() != excluded {
                let _ = outbox.value().send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn joined(name: &str) -> ServerEvent {
        ServerEvent::Joined { name: name.into() }
    }

    #[tokio::test]
    async fn test_send_reaches_only_target() {
        let hub = ConnectionHub::new();
        let mut rx1 = hub.register(&conn("c1"));
        let mut rx2 = hub.register(&conn("c2"));

        hub.send(&conn("c1"), joined("Alice")).await;

        assert_eq!(rx1.try_recv().unwrap(), joined("Alice"));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_all_reaches_everyone() {
        let hub = ConnectionHub::new();
        let mut rx1 = hub.register(&conn("c1"));
        let mut rx2 = hub.register(&conn("c2"));

        hub.broadcast_all(joined("Alice")).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_except_skips_excluded() {
        let hub = ConnectionHub::new();
        let mut rx1 = hub.register(&conn("c1"));
        let mut rx2 = hub.register(&conn("c2"));
        let mut rx3 = hub.register(&conn("c3"));

        hub.broadcast_except(&conn("c2"), joined("Alice")).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
        assert!(rx3.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_noop() {
        let hub = ConnectionHub::new();
        hub.send(&conn("ghost"), joined("Alice")).await;
    }

    #[tokio::test]
    async fn test_send_to_dropped_outbox_is_noop() {
        let hub = ConnectionHub::new();
        let rx = hub.register(&conn("c1"));
        drop(rx);

        // Receiver gone but still registered; delivery drops silently
        hub.send(&conn("c1"), joined("Alice")).await;
        hub.broadcast_all(joined("Bob")).await;
    }

    #[tokio::test]
    async fn test_unregister() {
        let hub = ConnectionHub::new();
        let _rx = hub.register(&conn("c1"));
        assert_eq!(hub.connection_count(), 1);

        hub.unregister(&conn("c1"));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_create_dispatch_delivers_message_once_to_sender() {
        use murmur_core::Coordinator;
        use murmur_protocol::ClientEvent;

        let hub = ConnectionHub::new();
        let coordinator = Coordinator::new();
        let alice = conn("c1");
        let mut outbox = hub.register(&alice);

        coordinator
            .dispatch(
                &alice,
                ClientEvent::CreateMessage {
                    name: "Alice".into(),
                    text: "hi".into(),
                    timestamp: 1000,
                },
                &hub,
            )
            .await;

        // The sender's own view comes from the broadcast alone; a
        // second copy would render the message twice client-side.
        let mut message_events = 0;
        while let Ok(event) = outbox.try_recv() {
            if matches!(event, ServerEvent::Message { .. }) {
                message_events += 1;
            }
        }
        assert_eq!(message_events, 1);
    }
}
