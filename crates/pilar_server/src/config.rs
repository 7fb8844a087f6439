//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the server behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default listening port when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration structure for the Pilar server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Largest accepted client message in bytes; larger ones get `bad_json`
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_message_size: 64 * 1024, // 64KB
        }
    }
}
