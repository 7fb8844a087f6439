//! Core server implementation and connection handling.
//!
//! This module contains the main server structure, the per-connection
//! handler and the shared shutdown state.

pub mod core;
pub mod handlers;
pub mod shutdown;

pub use core::PilarServer;
pub use shutdown::ShutdownState;
