//! # Pilar Server - Main Entry Point
//!
//! Shared-world WebSocket server. This crate handles CLI parsing,
//! configuration loading, logging, and application lifecycle management;
//! the protocol lives in `pilar_server` and the world model in `pilar_world`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (ws://0.0.0.0:3000)
//! pilar
//!
//! # Specify custom configuration
//! pilar --config production.toml
//!
//! # Override specific settings
//! PORT=8080 pilar --host 127.0.0.1 --log-level debug
//!
//! # JSON logging for production
//! pilar --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//! The `PORT` environment variable overrides the file, and CLI flags
//! override both.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)
//!
//! A second signal exits immediately.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the server from parsed process arguments.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging_config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_config.level = level.clone();
    }

    // Setup logging before anything else
    if let Err(e) = logging::setup_logging(&logging_config, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, ServerSettings};
