//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! server startup, health monitoring, and shutdown.

use crate::{
    cli::CliArgs,
    config::{AppConfig, PORT_ENV_VAR},
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use pilar_server::{connection::ConnectionManager, PilarServer, ShutdownState};
use pilar_world::WorldStore;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Main application struct.
///
/// The `Application` struct manages the complete lifecycle of the Pilar server,
/// including configuration loading, server initialization, health monitoring,
/// and graceful shutdown handling.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Server instance
    server: PilarServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply the `PORT` environment variable, then command-line overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let file_config = AppConfig::load_from_file(&args.config_path).await?;

        let env_port = std::env::var(PORT_ENV_VAR).ok();
        let config = apply_overrides(file_config, &args, env_port.as_deref());

        // Validate configuration
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let server = PilarServer::new(server_config);

        Ok(Self { config, server })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the application ran and shut down successfully, or an error
    /// if signal handling could not be installed.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Pilar Server Application");
        self.log_configuration_summary();

        let world = self.server.get_world();
        let connection_manager = self.server.get_connection_manager();
        let config = self.config.clone();

        let shutdown_state = ShutdownState::new();

        // Start server in background
        let server_handle = {
            let server = self.server;
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        // Start monitoring task for periodic health logs
        let monitoring_handle = if config.server.stats_interval_secs > 0 {
            let world = world.clone();
            let connection_manager = connection_manager.clone();
            let shutdown_state = shutdown_state.clone();
            let period = Duration::from_secs(config.server.stats_interval_secs);

            Some(tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the first tick completes immediately
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => log_health(&world, &connection_manager).await,
                        _ = shutdown_state.wait_for_shutdown() => break,
                    }
                }
            }))
        } else {
            info!("⏸️ Health monitoring disabled (interval: 0s)");
            None
        };

        info!("✅ Pilar Server is now running!");
        info!(
            "🎮 Ready to accept connections on ws://{}:{}",
            config.server.host, config.server.port
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal
        setup_signal_handlers().await?;
        shutdown_state.initiate_shutdown();

        // A second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown signal received again, exiting immediately");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        if let Some(handle) = monitoring_handle {
            handle.abort();
        }

        info!("⏳ Waiting for server task to complete gracefully...");
        match tokio::time::timeout(Duration::from_secs(8), server_handle).await {
            Ok(_) => info!("✅ Server task completed gracefully"),
            Err(e) => warn!("⏰ Server task did not complete within timeout: {:?}", e),
        }

        shutdown_state.complete_shutdown();

        info!("📊 Final Statistics:");
        log_health(&world, &connection_manager).await;

        info!("✅ Pilar Server shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}:{}", self.config.server.host, self.config.server.port);
        info!("  📦 Max message size: {} bytes", self.config.server.max_message_size);
        info!("  ⏱️ Health log interval: {}s", self.config.server.stats_interval_secs);
        info!("  📝 Log level: {}", self.config.logging.level);
    }
}

/// Applies environment and command-line overrides on top of the file config.
///
/// Priority, highest first: CLI flags, the `PORT` variable, the file.
pub fn apply_overrides(mut config: AppConfig, args: &CliArgs, env_port: Option<&str>) -> AppConfig {
    if config.apply_port_env(env_port) {
        info!("🔧 Using port {} from {}", config.server.port, PORT_ENV_VAR);
    }

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }

    if args.json_logs {
        config.logging.json_format = true;
    }

    config
}

async fn log_health(world: &WorldStore, connection_manager: &Arc<ConnectionManager>) {
    let stats = world.stats().await;
    let connections = connection_manager.connection_count().await;
    let joined = connection_manager.joined_count().await;

    info!(
        "📊 System Health - {} connections ({} joined) | {} players | {} spaces | {} mail | {} pending notifications",
        connections, joined, stats.players, stats.spaces, stats.mail_items, stats.pending_notifications
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> CliArgs {
        CliArgs {
            config_path: PathBuf::from("config.toml"),
            host: None,
            port: None,
            log_level: None,
            json_logs: false,
        }
    }

    #[test]
    fn test_file_config_without_overrides() {
        let mut file = AppConfig::default();
        file.server.port = 4000;

        let config = apply_overrides(file, &args(), None);
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_env_port_beats_file() {
        let mut file = AppConfig::default();
        file.server.port = 4000;

        let config = apply_overrides(file, &args(), Some("5000"));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_env_port_keeps_file_port() {
        let mut file = AppConfig::default();
        file.server.port = 4000;

        let config = apply_overrides(file, &args(), Some("nope"));
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_cli_beats_env() {
        let cli = CliArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(6000),
            log_level: Some("debug".to_string()),
            json_logs: true,
            ..args()
        };

        let config = apply_overrides(AppConfig::default(), &cli, Some("5000"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_application_creation_from_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: dir.path().join("pilar.toml"),
            host: Some("127.0.0.1".to_string()),
            port: Some(0),
            ..args()
        };

        let app = Application::new(cli.clone()).await.unwrap();
        assert!(cli.config_path.exists());
        assert_eq!(app.server.config().bind_address.ip().to_string(), "127.0.0.1");
        assert_eq!(app.server.config().bind_address.port(), 0);
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: dir.path().join("pilar.toml"),
            log_level: Some("loud".to_string()),
            ..args()
        };

        assert!(Application::new(cli).await.is_err());
    }
}
