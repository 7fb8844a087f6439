//! Connection manager for tracking and managing client connections.
//!
//! This module provides the session registry: which live connection is bound
//! to which player identifier, and message delivery to a single connection or
//! to every connection joined as an identifier.

use super::{client::ClientConnection, ConnectionId, Outbox};
use crate::messaging::{encode_server_message, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Central manager for all client connections.
///
/// The `ConnectionManager` tracks active connections, assigns unique IDs,
/// records which identifier each connection joined as, and queues outgoing
/// messages. One identifier may be bound to several connections at once (the
/// same player in two tabs); all of them receive deliveries for it.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe connection storage
/// * Implements atomic connection ID generation
/// * Each connection owns an unbounded outgoing queue drained by its writer task
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,

    /// Atomic counter for generating unique connection IDs
    next_id: Arc<AtomicUsize>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Creates a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Adds a new connection and returns its unique ID.
    ///
    /// The connection starts unjoined.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbox` - Queue feeding the connection's writer task
    ///
    /// # Returns
    ///
    /// A unique `ConnectionId` assigned to this connection.
    pub async fn add_connection(&self, remote_addr: SocketAddr, outbox: Outbox) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let connection = ClientConnection::new(remote_addr, outbox);
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, connection);
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Removes a connection and with it any session binding.
    ///
    /// Player, space and mail state are untouched.
    ///
    /// # Returns
    ///
    /// The identifier the connection was joined as, if any.
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> Option<String> {
        let mut connections = self.connections.write().await;
        let connection = connections.remove(&connection_id)?;
        let lifetime = connection.connected_at.elapsed().unwrap_or_default();
        info!(
            "❌ Connection {} from {} disconnected after {:.1}s{}",
            connection_id,
            connection.remote_addr,
            lifetime.as_secs_f64(),
            connection
                .fid
                .as_deref()
                .map(|fid| format!(" (was {fid})"))
                .unwrap_or_default()
        );
        connection.fid
    }

    /// Binds a connection to a player identifier.
    ///
    /// Joining again on the same connection replaces the previous binding.
    ///
    /// # Returns
    ///
    /// `false` if the connection is no longer registered.
    pub async fn join(&self, connection_id: ConnectionId, fid: &str) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get_mut(&connection_id) {
            Some(connection) => {
                if let Some(previous) = connection.fid.replace(fid.to_string()) {
                    debug!("🔁 Connection {} rebinding from {} to {}", connection_id, previous, fid);
                }
                info!("👋 Connection {} joined as {}", connection_id, fid);
                true
            }
            None => false,
        }
    }

    /// Retrieves the identifier a connection joined as.
    ///
    /// # Returns
    ///
    /// `None` if the connection doesn't exist or hasn't joined.
    pub async fn get_fid(&self, connection_id: ConnectionId) -> Option<String> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).and_then(|c| c.fid.clone())
    }

    /// Lists every live connection currently joined as `fid`.
    pub async fn connections_for_fid(&self, fid: &str) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        let mut ids: Vec<_> = connections
            .iter()
            .filter(|(_, connection)| connection.fid.as_deref() == Some(fid))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sends a message to a specific connection.
    ///
    /// # Returns
    ///
    /// `true` if the message was queued, `false` if the connection is gone or
    /// the message could not be encoded.
    pub async fn send_to_connection(&self, connection_id: ConnectionId, message: &ServerMessage) -> bool {
        let Some(text) = encode(message) else {
            return false;
        };

        let connections = self.connections.read().await;
        let queued = connections
            .get(&connection_id)
            .is_some_and(|connection| connection.send(text));

        if queued {
            debug!("📤 Queued '{}' for connection {}", message.kind(), connection_id);
        } else {
            debug!("🕳️ Dropped '{}' for closed connection {}", message.kind(), connection_id);
        }
        queued
    }

    /// Sends a message to every connection currently joined as `fid`.
    ///
    /// Nobody being connected is not an error: the push is simply dropped.
    ///
    /// # Returns
    ///
    /// The number of connections the message was queued for.
    pub async fn send_to_fid(&self, fid: &str, message: &ServerMessage) -> usize {
        let Some(text) = encode(message) else {
            return 0;
        };

        let connections = self.connections.read().await;
        let delivered = connections
            .values()
            .filter(|connection| connection.fid.as_deref() == Some(fid))
            .filter(|connection| connection.send(text.clone()))
            .count();

        debug!("📡 Sent '{}' to {} connection(s) of {}", message.kind(), delivered, fid);
        delivered
    }

    /// Number of open connections, joined or not.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of open connections that have joined.
    pub async fn joined_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.values().filter(|c| c.is_joined()).count()
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match encode_server_message(message) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to encode '{}' message: {}", message.kind(), e);
            None
        }
    }
}
