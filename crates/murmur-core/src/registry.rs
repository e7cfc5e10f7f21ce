//! Connection identity registry.
//!
//! Maps an opaque connection id to the display name chosen on `join`.
//! The map is keyed by connection id, not by name: two connections
//! may hold the same display name, and a connection with no entry is
//! in the anonymous state. Updates to different connection ids
//! proceed in parallel; same-id updates serialize on the map entry.

use crate::connection::ConnectionId;
use dashmap::DashMap;
use tracing::debug;

/// Registry of connection identities.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    names: DashMap<ConnectionId, String>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or overwrite the display name for a connection.
    ///
    /// Idempotent; re-joining under the same connection id silently
    /// replaces the old name, and no event is emitted on rename.
    pub fn identify(&self, connection_id: &ConnectionId, name: impl Into<String>) {
        let name = name.into();
        debug!(connection = %connection_id, name = %name, "Identified connection");
        self.names.insert(connection_id.clone(), name);
    }

    /// Get the display name bound to a connection.
    ///
    /// Returns `None` for a never-identified connection; callers must
    /// treat that as a legitimate state, not a failure.
    #[must_use]
    pub fn name_of(&self, connection_id: &ConnectionId) -> Option<String> {
        self.names.get(connection_id).map(|name| name.clone())
    }

    /// Drop the entry for a connection.
    ///
    /// Wired on transport disconnect to bound registry growth.
    pub fn forget(&self, connection_id: &ConnectionId) {
        if self.names.remove(connection_id).is_some() {
            debug!(connection = %connection_id, "Forgot connection identity");
        }
    }

    /// Get the number of identified connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no connection is identified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_and_lookup() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new("c1");

        registry.identify(&conn, "Alice");
        assert_eq!(registry.name_of(&conn), Some("Alice".to_string()));
    }

    #[test]
    fn test_rejoin_overwrites() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new("c1");

        registry.identify(&conn, "Alice");
        registry.identify(&conn, "Bob");
        assert_eq!(registry.name_of(&conn), Some("Bob".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_connection_is_anonymous() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.name_of(&ConnectionId::new("ghost")), None);
    }

    #[test]
    fn test_same_name_across_connections() {
        let registry = ConnectionRegistry::new();
        registry.identify(&ConnectionId::new("c1"), "Alice");
        registry.identify(&ConnectionId::new("c2"), "Alice");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_forget() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new("c1");

        registry.identify(&conn, "Alice");
        registry.forget(&conn);
        assert_eq!(registry.name_of(&conn), None);
        assert!(registry.is_empty());

        // Forgetting an unknown connection is a no-op
        registry.forget(&conn);
    }
}
