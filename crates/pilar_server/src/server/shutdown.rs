//! Coordinated shutdown state shared between the application and the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Two-phase shutdown flags.
///
/// `initiated` stops the accept loop and background tasks; `complete` marks
/// that the application finished its own cleanup. Clones share the same
/// flags.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Flag indicating shutdown has been initiated - no new connections are accepted
    shutdown_initiated: Arc<watch::Sender<bool>>,
    /// Flag indicating cleanup has finished
    shutdown_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a new shutdown state with both flags set to false.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            shutdown_initiated: Arc::new(sender),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true if shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.shutdown_initiated.borrow()
    }

    /// Returns true if shutdown is complete and final cleanup can begin.
    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown and wakes every task waiting on it.
    pub fn initiate_shutdown(&self) {
        self.shutdown_initiated.send_replace(true);
        info!("🛑 Shutdown initiated - no new connections will be accepted");
    }

    /// Marks shutdown as complete.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Shutdown cleanup complete");
    }

    /// Resolves once shutdown has been initiated (immediately if it already was).
    pub async fn wait_for_shutdown(&self) {
        let mut receiver = self.shutdown_initiated.subscribe();
        // the sender lives in `self`, so this only fails if it was dropped
        let _ = receiver.wait_for(|initiated| *initiated).await;
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}
