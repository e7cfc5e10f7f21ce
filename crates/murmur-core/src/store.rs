//! Ordered in-memory message store.
//!
//! The store owns the authoritative message sequence. Ids are
//! assigned under the same write lock that appends the record, so
//! they are strictly increasing with no gaps or duplicates even under
//! concurrent creates. Reads take a shared lock and return snapshot
//! copies; the live sequence is never exposed.

use crate::error::RelayError;
use murmur_protocol::{ChatMessage, MessageId};
use std::sync::RwLock;
use tracing::{debug, trace};

/// First id handed out by a fresh store.
const ID_BASE: MessageId = 1;

struct StoreInner {
    next_id: MessageId,
    messages: Vec<ChatMessage>,
}

/// The ordered message store.
pub struct MessageStore {
    inner: RwLock<StoreInner>,
}

impl MessageStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                next_id: ID_BASE,
                messages: Vec::new(),
            }),
        }
    }

    /// Create a message, assigning the next id and appending it to
    /// the sequence. The stored record is returned, including the id.
    ///
    /// The timestamp is caller-supplied and stored verbatim.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `name` or `text` is empty.
    pub fn create(
        &self,
        name: impl Into<String>,
        text: impl Into<String>,
        timestamp: u64,
    ) -> Result<ChatMessage, RelayError> {
        let name = name.into();
        let text = text.into();

        if name.is_empty() {
            return Err(RelayError::InvalidInput("name must not be empty".into()));
        }
        if text.is_empty() {
            return Err(RelayError::InvalidInput("text must not be empty".into()));
        }

        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;

        let message = ChatMessage::new(id, name, text, timestamp);
        inner.messages.push(message.clone());

        trace!(id, "Stored message");
        Ok(message)
    }

    /// Get a snapshot of all messages in insertion order.
    #[must_use]
    pub fn list_all(&self) -> Vec<ChatMessage> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.messages.clone()
    }

    /// Remove and return the message with the given id.
    ///
    /// Other ids are unaffected; removed ids are never reassigned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no message has the given id.
    pub fn remove(&self, id: MessageId) -> Result<ChatMessage, RelayError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let position = inner
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or(RelayError::NotFound(id))?;

        let message = inner.messages.remove(position);
        debug!(id, "Removed message");
        Ok(message)
    }

    /// Replace a message's text and timestamp, preserving its id and
    /// original sender name. Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `text` is empty, or `NotFound` if no
    /// message has the given id.
    pub fn update(
        &self,
        id: MessageId,
        text: impl Into<String>,
        timestamp: u64,
    ) -> Result<ChatMessage, RelayError> {
        let text = text.into();
        if text.is_empty() {
            return Err(RelayError::InvalidInput("text must not be empty".into()));
        }

        let mut inner = self.inner.write().expect("store lock poisoned");
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RelayError::NotFound(id))?;

        message.text = text;
        message.timestamp = timestamp;

        let updated = message.clone();
        debug!(id, "Updated message");
        Ok(updated)
    }

    /// Get the number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.messages.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ids_strictly_increasing_from_base() {
        let store = MessageStore::new();

        for expected in 1..=5u64 {
            let msg = store.create("Alice", "hi", 0).unwrap();
            assert_eq!(msg.id, expected);
        }
    }

    #[test]
    fn test_list_all_is_a_snapshot() {
        let store = MessageStore::new();
        store.create("Alice", "one", 1).unwrap();

        let mut snapshot = store.list_all();
        snapshot.clear();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_preserves_other_ids() {
        let store = MessageStore::new();
        store.create("Alice", "one", 1).unwrap();
        store.create("Bob", "two", 2).unwrap();
        store.create("Carol", "three", 3).unwrap();

        let removed = store.remove(2).unwrap();
        assert_eq!(removed.name, "Bob");

        let ids: Vec<u64> = store.list_all().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);

        // Removed ids are never reassigned
        assert_eq!(store.create("Dave", "four", 4).unwrap().id, 4);
    }

    #[test]
    fn test_remove_unknown_id_leaves_store_unchanged() {
        let store = MessageStore::new();
        store.create("Alice", "hi", 0).unwrap();

        assert!(matches!(store.remove(99), Err(RelayError::NotFound(99))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list_all()[0].id, 1);
    }

    #[test]
    fn test_update_preserves_id_and_name() {
        let store = MessageStore::new();
        store.create("Alice", "hi", 1000).unwrap();

        let updated = store.update(1, "edited", 2000).unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.timestamp, 2000);

        assert_eq!(store.list_all()[0], updated);
    }

    #[test]
    fn test_update_unknown_id() {
        let store = MessageStore::new();
        assert!(matches!(store.update(1, "x", 0), Err(RelayError::NotFound(1))));
    }

    #[test]
    fn test_empty_fields_rejected() {
        let store = MessageStore::new();
        assert!(matches!(
            store.create("", "hi", 0),
            Err(RelayError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create("Alice", "", 0),
            Err(RelayError::InvalidInput(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_scenario_create_list_remove() {
        let store = MessageStore::new();

        let first = store.create("Alice", "hi", 1000).unwrap();
        assert_eq!(first, ChatMessage::new(1, "Alice", "hi", 1000));

        let second = store.create("Bob", "yo", 1001).unwrap();
        assert_eq!(second.id, 2);

        assert_eq!(store.list_all(), vec![first.clone(), second.clone()]);

        assert_eq!(store.remove(1).unwrap(), first);
        assert_eq!(store.list_all(), vec![second]);
    }

    #[test]
    fn test_concurrent_creates_never_duplicate_ids() {
        let store = Arc::new(MessageStore::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    store.create("Alice", "hi", 0).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<u64> = store.list_all().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 800);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 800);
    }
}
