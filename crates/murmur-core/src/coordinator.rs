//! Event coordinator for the Murmur relay.
//!
//! The coordinator is a stateless dispatcher over the message store
//! and the connection registry. For every inbound event it mutates
//! the relevant store and decides what goes back out and to whom:
//!
//! - `createMessage` and `typing` are notifications and fan out to
//!   the whole room so every chat view stays consistent.
//! - `findAllMessages`, `removeMessage`, `updateMessage`, and `join`
//!   are request/response and answer the caller only.
//!
//! Store mutations complete and release their lock before any sink
//! call, so in-memory contention never couples to delivery latency.

use crate::connection::ConnectionId;
use crate::error::RelayError;
use crate::registry::ConnectionRegistry;
use crate::sink::EventSink;
use crate::store::MessageStore;
use murmur_protocol::{ClientEvent, ServerEvent};
use tracing::{debug, trace, warn};

/// The event coordinator.
///
/// Holds the two stores; constructed once at process start and shared
/// behind an `Arc` by every connection task.
pub struct Coordinator {
    store: MessageStore,
    registry: ConnectionRegistry,
}

impl Coordinator {
    /// Create a coordinator with fresh, empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MessageStore::new(),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Access the message store.
    #[must_use]
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Access the connection registry.
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Process one inbound event from a connection.
    ///
    /// Errors never escape: `InvalidInput` and `NotFound` become an
    /// `error` event unicast to the originating connection, and no
    /// other connection's stream is touched by them.
    pub async fn dispatch(
        &self,
        connection: &ConnectionId,
        event: ClientEvent,
        sink: &impl EventSink,
    ) {
        trace!(connection = %connection, event = event.name(), "Dispatching event");

        match self.apply(connection, event, sink).await {
            Ok(Some(response)) => sink.send(connection, response).await,
            Ok(None) => {}
            Err(err) => {
                debug!(connection = %connection, error = %err, "Request failed");
                sink.send(connection, ServerEvent::error(err.code(), err.to_string()))
                    .await;
            }
        }
    }

    /// Apply an event's effect and compute the unicast response, if
    /// any. Broadcasts are emitted from here; only request/response
    /// events produce a unicast answer.
    async fn apply(
        &self,
        connection: &ConnectionId,
        event: ClientEvent,
        sink: &impl EventSink,
    ) -> Result<Option<ServerEvent>, RelayError> {
        match event {
            ClientEvent::CreateMessage {
                name,
                text,
                timestamp,
            } => {
                let message = self.store.create(name, text, timestamp)?;
                debug!(connection = %connection, id = message.id, "Created message");

                // Everyone sees the new message, the sender included;
                // the broadcast reaching the sender is the ack, so no
                // separate response goes out.
                sink.broadcast_all(ServerEvent::Message { message }).await;

                Ok(None)
            }

            ClientEvent::FindAllMessages => {
                let messages = self.store.list_all();
                trace!(connection = %connection, count = messages.len(), "Listing messages");
                Ok(Some(ServerEvent::MessageList { messages }))
            }

            ClientEvent::RemoveMessage { id } => {
                // Removal answers the requester only; other clients
                // are not notified.
                let message = self.store.remove(id)?;
                Ok(Some(ServerEvent::MessageRemoved { message }))
            }

            ClientEvent::UpdateMessage {
                id,
                text,
                timestamp,
            } => {
                let message = self.store.update(id, text, timestamp)?;
                Ok(Some(ServerEvent::MessageUpdated { message }))
            }

            ClientEvent::Join { name } => {
                if name.is_empty() {
                    return Err(RelayError::InvalidInput("name must not be empty".into()));
                }
                self.registry.identify(connection, name.clone());
                Ok(Some(ServerEvent::Joined { name }))
            }

            ClientEvent::Typing { is_typing } => {
                match self.registry.name_of(connection) {
                    Some(name) => {
                        sink.broadcast_except(
                            connection,
                            ServerEvent::Typing { name, is_typing },
                        )
                        .await;
                    }
                    None => {
                        // An unidentified typist is a degraded but
                        // valid state; drop the indicator.
                        warn!(connection = %connection, "Typing from unidentified connection");
                    }
                }
                Ok(None)
            }
        }
    }

    /// Release per-connection state when the transport reports a
    /// disconnect. Stored messages are untouched.
    pub fn connection_closed(&self, connection: &ConnectionId) {
        self.registry.forget(connection);
        debug!(connection = %connection, "Connection closed");
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
