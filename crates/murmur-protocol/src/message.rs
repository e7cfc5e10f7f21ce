//! The chat message record.
//!
//! A `ChatMessage` is both the stored record and the wire payload of
//! the `message` event; the two never diverge.

use serde::{Deserialize, Serialize};

/// A unique message identifier, assigned by the store.
pub type MessageId = u64;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier, strictly increasing, never reused.
    pub id: MessageId,
    /// Sender's display name at creation time. A later identity
    /// change does not retroactively rename past messages.
    pub name: String,
    /// Message body.
    pub text: String,
    /// Client-supplied instant in milliseconds. The server stores it
    /// verbatim and never overwrites it.
    pub timestamp: u64,
}

impl ChatMessage {
    /// Create a new chat message record.
    #[must_use]
    pub fn new(
        id: MessageId,
        name: impl Into<String>,
        text: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            text: text.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::new(1, "Alice", "hi", 1000);
        assert_eq!(msg.id, 1);
        assert_eq!(msg.name, "Alice");
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.timestamp, 1000);
    }

    #[test]
    fn test_message_wire_shape() {
        let msg = ChatMessage::new(2, "Bob", "yo", 1001);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 2, "name": "Bob", "text": "yo", "timestamp": 1001})
        );
    }
}
