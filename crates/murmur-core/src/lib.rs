//! # murmur-core
//!
//! Message store, identity registry, and event coordination for the
//! Murmur relay.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **MessageStore** - Ordered, id-assigning chat message storage
//! - **ConnectionRegistry** - Connection id to display name mapping
//! - **Coordinator** - Per-event contracts and broadcast policy
//! - **EventSink** - Delivery interface implemented by the transport
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Transport  │────▶│  Coordinator │────▶│ MessageStore │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!        ▲                    │
//!        │  EventSink         ▼
//!        │             ┌──────────────────┐
//!        └─────────────│ConnectionRegistry│
//!                      └──────────────────┘
//! ```

pub mod connection;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod sink;
pub mod store;

pub use connection::ConnectionId;
pub use coordinator::Coordinator;
pub use error::RelayError;
pub use registry::ConnectionRegistry;
pub use sink::EventSink;
pub use store::MessageStore;
