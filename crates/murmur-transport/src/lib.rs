//! # murmur-transport
//!
//! Connection fan-out and delivery plumbing for the Murmur relay.
//!
//! The [`ConnectionHub`] is the bridge between the coordinator's
//! delivery decisions and the per-connection socket tasks: the
//! coordinator pushes [`murmur_protocol::ServerEvent`]s through the
//! [`murmur_core::EventSink`] interface, and each socket task drains
//! its own outbox queue onto the wire.
//!
//! ```rust
//! use murmur_core::{ConnectionId, EventSink};
//! use murmur_transport::ConnectionHub;
//!
//! # async fn demo() {
//! let hub = ConnectionHub::new();
//! let mut outbox = hub.register(&ConnectionId::new("c1"));
//!
//! hub.broadcast_all(murmur_protocol::ServerEvent::Joined {
//!     name: "Alice".into(),
//! })
//! .await;
//!
//! assert!(outbox.try_recv().is_ok());
//! # }
//! ```

pub mod hub;

pub use hub::{ConnectionHub, Outbox};
