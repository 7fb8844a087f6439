//! Utility functions and helper methods for the Pilar server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, server::PilarServer};

/// Creates a new server with default configuration.
///
/// # Returns
///
/// A new `PilarServer` bound to `0.0.0.0:3000` once started.
///
/// # Example
///
/// ```rust
/// use pilar_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().bind_address.port(), 3000);
/// ```
pub fn create_server() -> PilarServer {
    PilarServer::new(ServerConfig::default())
}

/// Creates a new server with custom configuration.
///
/// # Arguments
///
/// * `config` - A `ServerConfig` instance with desired settings
///
/// # Example
///
/// ```rust
/// use pilar_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "127.0.0.1:9000".parse().unwrap(),
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// assert_eq!(server.config().bind_address.port(), 9000);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> PilarServer {
    PilarServer::new(config)
}
