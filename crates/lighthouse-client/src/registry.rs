//! Connection registry: at most one live connection per destination.
//!
//! The registry is an explicitly constructed instance, not process-wide
//! state. Embedders create one, share the `Arc`, and tear it down with
//! [`DisplayRegistry::shutdown`] when they are done.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::connection::{ConnectOptions, Connection};

/// WebSocket endpoint of the production display service.
pub const DEFAULT_DESTINATION: &str = "wss://lighthouse.uni-kiel.de/websocket";

/// Hands out connections and keeps them unique per destination.
pub struct DisplayRegistry {
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl DisplayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the live connection for `destination`, creating and
    /// registering one when none exists.
    ///
    /// A freshly created connection starts connecting in the background;
    /// this call never waits for the handshake. The check-and-register step
    /// holds the registry lock, so two concurrent acquisitions of the same
    /// destination get the same connection. A registered entry that is
    /// already closed (explicitly or because its transport died) is replaced
    /// by a fresh connection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn acquire(self: &Arc<Self>, destination: &str, options: ConnectOptions) -> Arc<Connection> {
        let mut connections = self.connections.lock().unwrap();
        if let Some(existing) = connections.get(destination) {
            if !existing.is_closed() {
                return Arc::clone(existing);
            }
        }
        let connection = Connection::spawn(destination.to_owned(), options, Arc::downgrade(self));
        connections.insert(destination.to_owned(), Arc::clone(&connection));
        connection
    }

    /// [`DisplayRegistry::acquire`] for [`DEFAULT_DESTINATION`] with default
    /// options.
    pub fn acquire_default(self: &Arc<Self>) -> Arc<Connection> {
        self.acquire(DEFAULT_DESTINATION, ConnectOptions::default())
    }

    /// Removes `connection`'s entry. No-op when the destination has already
    /// been re-acquired: a closed connection must not evict its replacement.
    pub(crate) fn deregister(&self, destination: &str, connection: &Connection) {
        let mut connections = self.connections.lock().unwrap();
        if let Some(registered) = connections.get(destination) {
            if std::ptr::eq(Arc::as_ptr(registered), connection) {
                connections.remove(destination);
            }
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every registered connection.
    pub async fn shutdown(&self) {
        let connections: Vec<Arc<Connection>> = self
            .connections
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        for connection in connections {
            connection.close().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
