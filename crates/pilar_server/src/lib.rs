//! # Pilar Server - Shared World over WebSockets
//!
//! A small multiplayer world server. Players identified by an opaque `fid`
//! join over a WebSocket, each receives a home space marked by a 3x3 obelisk
//! on a shared grid, moves around, and exchanges mail with other players.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **World Store** ([`pilar_world::WorldStore`]) - Players, spaces, mail and
//!   notifications behind one coarse lock
//! * **Connection Manager** - WebSocket lifecycle and the connection to
//!   identifier mapping, with delivery to one connection or every session of
//!   an identifier
//! * **Router** - Per-connection state machine turning client messages into
//!   world operations and pushes
//!
//! ### Message Flow
//!
//! 1. Client sends a JSON text frame tagged by `type`
//! 2. The codec decodes it leniently (numbers become strings, bad deltas become 0)
//! 3. The router checks the session state and applies the operation to the world
//! 4. Replies (`state`, `mail`, `notify`, `error`) are queued on the affected
//!    connections and written by their outgoing tasks
//!
//! ```text
//! client                          server
//!   | {"type":"hello","fid":"a"}    |
//!   |------------------------------>|
//!   |   state, mail, [notify]       |
//!   |<------------------------------|
//!   | {"type":"move","dx":1,"dy":0} |
//!   |------------------------------>|
//!   |   state                       |
//!   |<------------------------------|
//! ```
//!
//! ## Error Handling
//!
//! * [`ServerError`] - Binding and handshake failures
//! * [`ProtocolError`] - Rejected client input, answered with
//!   `{"type":"error","message":<code>}` on the offending connection only
//!
//! ## Thread Safety
//!
//! * The session registry uses `Arc<RwLock<HashMap>>`
//! * Every world operation runs under a single async mutex, so mail ids stay
//!   unique and contiguous and no two players share a home

pub use config::ServerConfig;
pub use error::{ProtocolError, ServerError};
pub use server::{PilarServer, ShutdownState};
pub use utils::{create_server, create_server_with_config};

// Public modules
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod server;
pub mod utils;
