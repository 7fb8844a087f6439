//! Core server implementation.
//!
//! This module contains the main `PilarServer` struct, which owns the shared
//! world store and the session registry and runs the WebSocket accept loop.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::{handlers::handle_connection, shutdown::ShutdownState},
};
use pilar_world::WorldStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// The core world server structure.
///
/// `PilarServer` ties together the networking layer and the world. Every
/// accepted connection shares the same [`WorldStore`] and
/// [`ConnectionManager`], so all sessions observe one consistent world.
pub struct PilarServer {
    /// Server configuration settings
    config: ServerConfig,
    /// Shared world state
    world: WorldStore,
    /// Session registry and message delivery
    connection_manager: Arc<ConnectionManager>,
    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl PilarServer {
    /// Creates a new server with an empty world.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration parameters for server behavior
    pub fn new(config: ServerConfig) -> Self {
        Self::with_world(config, WorldStore::new())
    }

    /// Creates a new server around an existing world store.
    ///
    /// Useful when the caller wants to inspect or seed the world directly.
    pub fn with_world(config: ServerConfig, world: WorldStore) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        Self {
            config,
            world,
            connection_manager: Arc::new(ConnectionManager::new()),
            shutdown_sender,
        }
    }

    /// Starts the server and runs until shutdown is requested through the
    /// provided shutdown state or [`PilarServer::shutdown`].
    ///
    /// # Returns
    ///
    /// `Ok(())` if the server started and stopped cleanly, or a `ServerError`
    /// if the listener could not be bound.
    pub async fn start_with_shutdown_state(&self, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the server and runs until [`PilarServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting Pilar server on {}", self.config.bind_address);

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address)))?;

        self.serve(listener, shutdown_state).await
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Each accepted connection is handled on its own task. The loop ends when
    /// shutdown is initiated, when [`PilarServer::shutdown`] is called, or when
    /// accepting fails.
    ///
    /// # Arguments
    ///
    /// * `listener` - A bound TCP listener (tests bind `127.0.0.1:0`)
    /// * `shutdown_state` - Optional shared shutdown state
    pub async fn serve(&self, listener: TcpListener, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        info!("🌐 Listening for WebSocket connections on ws://{}", local_addr);

        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let max_message_size = self.config.max_message_size;

        let accept_loop = async {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let connection_manager = self.connection_manager.clone();
                        let world = self.world.clone();

                        // Spawn individual connection handler
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, addr, connection_manager, world, max_message_size).await
                            {
                                debug!("Connection error from {}: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        break;
                    }
                }
            }
        };

        let external_shutdown = async {
            match &shutdown_state {
                Some(shutdown_state) => shutdown_state.wait_for_shutdown().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = accept_loop => {}
            _ = external_shutdown => {
                info!("🛑 Accept loop stopping - shutdown initiated");
            }
            _ = shutdown_receiver.recv() => {
                info!("Internal shutdown signal received");
            }
        }

        info!("✅ Server stopped accepting connections");
        Ok(())
    }

    /// Signals the accept loop to stop.
    ///
    /// Live connections keep running until their clients disconnect.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    /// Gets a handle to the shared world store.
    pub fn get_world(&self) -> WorldStore {
        self.world.clone()
    }

    /// Gets the session registry.
    pub fn get_connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    /// Gets the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
