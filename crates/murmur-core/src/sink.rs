//! Delivery interface the coordinator drives.
//!
//! The transport layer owns connection lifetime and actual delivery;
//! the core only decides who receives which event. Implementations
//! must be fire-and-forget: a target that disconnected between
//! decision and delivery is dropped silently, and no implementation
//! may block the caller on network latency.

use crate::connection::ConnectionId;
use async_trait::async_trait;
use murmur_protocol::ServerEvent;

/// Outbound delivery capabilities required from the transport.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver an event to a single connection.
    async fn send(&self, target: &ConnectionId, event: ServerEvent);

    /// Deliver an event to every connected client.
    async fn broadcast_all(&self, event: ServerEvent);

    /// Deliver an event to every connected client except one.
    async fn broadcast_except(&self, excluded: &ConnectionId, event: ServerEvent);
}
