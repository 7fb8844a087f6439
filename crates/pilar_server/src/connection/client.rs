//! Client connection representation.
//!
//! This module defines the structure of an individual client connection,
//! tracking its session binding and the queue its writer task drains.

use std::net::SocketAddr;
use std::time::SystemTime;
use tokio::sync::mpsc;

/// Sending half of a connection's outgoing queue.
///
/// Each connection's writer task owns the receiving half and forwards every
/// queued text frame to the socket in order.
pub type Outbox = mpsc::UnboundedSender<String>;

/// Represents an individual client connection to the server.
///
/// # Fields
///
/// * `fid` - The identifier this connection joined as (None until it joins)
/// * `remote_addr` - The network address of the connected client
/// * `connected_at` - Timestamp when the connection was established
#[derive(Debug)]
pub struct ClientConnection {
    /// The identifier bound by the last successful join
    pub fid: Option<String>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    outbox: Outbox,
}

impl ClientConnection {
    /// Creates a new, unjoined client connection.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbox` - Queue feeding the connection's writer task
    pub fn new(remote_addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            fid: None,
            remote_addr,
            connected_at: SystemTime::now(),
            outbox,
        }
    }

    pub fn is_joined(&self) -> bool {
        self.fid.is_some()
    }

    /// Queues a text frame. Returns `false` if the writer has gone away.
    pub fn send(&self, text: String) -> bool {
        self.outbox.send(text).is_ok()
    }
}
