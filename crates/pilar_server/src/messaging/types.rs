//! Message type definitions for client-server communication.
//!
//! The protocol is a closed vocabulary of four client kinds and four server
//! kinds, each a JSON object with a `type` discriminator plus kind-specific
//! fields:
//!
//! ```json
//! {"type": "hello", "fid": "alice"}
//! {"type": "move", "dx": 1, "dy": 0}
//! {"type": "mail_send", "to": "bob", "subject": "hi", "body": "hello"}
//! {"type": "mail_list"}
//! ```
//!
//! and from the server:
//!
//! ```json
//! {"type": "state", "data": {"player": {...}, "spaces": [...]}}
//! {"type": "mail", "items": [...]}
//! {"type": "notify", "items": [{"text": "Mail from alice", "createdAt": 0}]}
//! {"type": "error", "message": "not_joined"}
//! ```

use crate::error::ProtocolError;
use pilar_world::{MailItem, Notification, Snapshot};
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
///
/// Decoding is lenient per field (see [`crate::messaging::decode_client_message`]),
/// so by the time a value of this type exists every string is trimmed and
/// every delta is a plain integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Bind this connection to a player identifier
    #[serde(rename = "hello")]
    Join { fid: String },

    /// Shift the player by a delta; missing deltas are 0
    #[serde(rename = "move")]
    Move { dx: i64, dy: i64 },

    /// Send mail to another identifier
    #[serde(rename = "mail_send")]
    MailSend {
        to: String,
        subject: String,
        body: String,
    },

    /// Request the current mailbox and pending notifications
    #[serde(rename = "mail_list")]
    MailList,
}

/// A message pushed from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The player's snapshot after a join or move
    State { data: Snapshot },

    /// A full mailbox listing
    Mail { items: Vec<MailItem> },

    /// Notifications drained for the receiving identifier
    Notify { items: Vec<Notification> },

    /// A rejected request, carrying a reason code
    Error { message: String },
}

impl ServerMessage {
    /// Builds the error reply for a rejected request.
    pub fn error(error: ProtocolError) -> Self {
        ServerMessage::Error {
            message: error.code().to_string(),
        }
    }

    /// The wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::State { .. } => "state",
            ServerMessage::Mail { .. } => "mail",
            ServerMessage::Notify { .. } => "notify",
            ServerMessage::Error { .. } => "error",
        }
    }
}
