//! Signal handling for graceful server shutdown.
//!
//! The first SIGINT/SIGTERM (Ctrl+C on Windows) starts a graceful shutdown;
//! the application listens again afterwards so a second signal can force exit.

use pilar_server::ShutdownState;
use tokio::signal;
use tracing::info;

/// Waits for a termination signal and logs it.
///
/// # Returns
///
/// A shutdown state that has already been initiated, or an error if signal
/// handling setup failed.
pub async fn setup_signal_handlers() -> Result<ShutdownState, Box<dyn std::error::Error>> {
    let shutdown_state = setup_signal_handlers_silent().await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    Ok(shutdown_state)
}

/// Waits for a termination signal without logging.
pub async fn setup_signal_handlers_silent() -> Result<ShutdownState, Box<dyn std::error::Error>> {
    let shutdown_state = ShutdownState::new();

    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    shutdown_state.initiate_shutdown();
    Ok(shutdown_state)
}
