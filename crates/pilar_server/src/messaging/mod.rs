//! Message handling and routing for client-server communication.
//!
//! This module provides the protocol vocabulary, its JSON codec, and the
//! per-connection state machine that dispatches decoded messages to the world.

pub mod codec;
pub mod router;
pub mod types;

pub use codec::{decode_client_message, encode_server_message};
pub use router::route_client_message;
pub use types::{ClientMessage, ServerMessage};
