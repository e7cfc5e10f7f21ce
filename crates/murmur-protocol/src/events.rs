//! Event types for the Murmur protocol.
//!
//! Events are the messages exchanged between clients and the relay.
//! Each event carries its name in an `event` tag field; the names are
//! part of the wire contract and must not change.

use crate::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// An event sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
    /// Create a new chat message and fan it out to everyone.
    #[serde(rename = "createMessage")]
    CreateMessage {
        /// Sender's display name.
        name: String,
        /// Message body.
        text: String,
        /// Client-supplied instant in milliseconds.
        timestamp: u64,
    },

    /// Request the full ordered message history.
    #[serde(rename = "findAllMessages")]
    FindAllMessages,

    /// Remove a message by id.
    #[serde(rename = "removeMessage")]
    RemoveMessage {
        /// Id of the message to remove.
        id: u64,
    },

    /// Replace a message's body and timestamp.
    #[serde(rename = "updateMessage")]
    UpdateMessage {
        /// Id of the message to update.
        id: u64,
        /// Replacement body.
        text: String,
        /// Replacement instant in milliseconds.
        timestamp: u64,
    },

    /// Register a display name for this connection.
    #[serde(rename = "join")]
    Join {
        /// Chosen display name.
        name: String,
    },

    /// Signal that this connection started or stopped typing.
    #[serde(rename = "typing")]
    Typing {
        /// Whether the client is currently typing.
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

impl ClientEvent {
    /// Get the wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateMessage { .. } => "createMessage",
            ClientEvent::FindAllMessages => "findAllMessages",
            ClientEvent::RemoveMessage { .. } => "removeMessage",
            ClientEvent::UpdateMessage { .. } => "updateMessage",
            ClientEvent::Join { .. } => "join",
            ClientEvent::Typing { .. } => "typing",
        }
    }
}

/// An event sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// Handshake greeting carrying the connection's identifier.
    #[serde(rename = "connected")]
    Connected {
        /// Unique connection identifier.
        #[serde(rename = "connectionId")]
        connection_id: String,
    },

    /// A newly created message, broadcast to every connection.
    #[serde(rename = "message")]
    Message {
        /// The created record, including the assigned id.
        message: ChatMessage,
    },

    /// The full message history, in insertion order.
    #[serde(rename = "messages")]
    MessageList {
        /// Snapshot of all stored messages.
        messages: Vec<ChatMessage>,
    },

    /// A message was removed; sent to the requester only.
    #[serde(rename = "messageRemoved")]
    MessageRemoved {
        /// The removed record.
        message: ChatMessage,
    },

    /// A message was updated; sent to the requester only.
    #[serde(rename = "messageUpdated")]
    MessageUpdated {
        /// The updated record.
        message: ChatMessage,
    },

    /// Identity confirmation for a `join` request.
    #[serde(rename = "joined")]
    Joined {
        /// The display name now bound to the connection.
        name: String,
    },

    /// Typing indicator, broadcast to everyone except the typist.
    #[serde(rename = "typing")]
    Typing {
        /// Display name of the typist.
        name: String,
        /// Whether the typist is currently typing.
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    /// Error response, sent to the originating connection only.
    #[serde(rename = "error")]
    Error {
        /// Error code (see [`crate::error_codes`]).
        code: u16,
        /// Human-readable error message.
        message: String,
    },
}

impl ServerEvent {
    /// Get the wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::Message { .. } => "message",
            ServerEvent::MessageList { .. } => "messages",
            ServerEvent::MessageRemoved { .. } => "messageRemoved",
            ServerEvent::MessageUpdated { .. } => "messageUpdated",
            ServerEvent::Joined { .. } => "joined",
            ServerEvent::Typing { .. } => "typing",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// Create a new Error event.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }
}

/// Error codes carried by `error` events.
pub mod error_codes {
    /// Malformed payload: wrong type, missing field, or empty frame.
    pub const INVALID_INPUT: u16 = 1001;
    /// The referenced message id does not exist.
    pub const NOT_FOUND: u16 = 1004;
}
