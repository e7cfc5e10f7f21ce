//! # murmur-protocol
//!
//! Wire protocol definitions for the Murmur message relay.
//!
//! This crate defines the events exchanged between chat clients and
//! the relay, and the length-prefixed MessagePack codec that frames
//! them. Event and field names (`createMessage`, `isTyping`, ...) are
//! part of the wire contract and are pinned by serde renames.
//!
//! ## Events
//!
//! - `createMessage` / `message` - Post a message, fanned out to all
//! - `findAllMessages` / `messages` - Full history catch-up
//! - `removeMessage` / `updateMessage` - Manage existing messages
//! - `join` / `joined` - Bind a display name to the connection
//! - `typing` - Typing indicator, relayed to everyone else
//!
//! ## Example
//!
//! ```rust
//! use murmur_protocol::{codec, ClientEvent};
//!
//! let event = ClientEvent::Join { name: "Alice".into() };
//!
//! let encoded = codec::encode(&event).unwrap();
//! let decoded: ClientEvent = codec::decode(&encoded).unwrap();
//! assert_eq!(event, decoded);
//! ```

pub mod codec;
pub mod events;
pub mod message;

pub use codec::ProtocolError;
pub use events::{error_codes, ClientEvent, ServerEvent};
pub use message::{ChatMessage, MessageId};
