//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking, binding connections to player identifiers, and
//! delivering outgoing messages to one connection or to every connection
//! joined as a given identifier.

pub mod client;
pub mod manager;

pub use client::{ClientConnection, Outbox};
pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
