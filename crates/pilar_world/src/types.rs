//! Core data types for the shared world.
//!
//! Every type here serializes to the JSON shape clients already consume, so the
//! server can embed them directly in outgoing messages. Field renames
//! (`createdAt`, `type`) exist only to keep that wire shape.

use serde::{Deserialize, Serialize};

/// An integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// The kind of a tile inside a space.
///
/// Only obelisk tiles exist today; spaces are stamped with them at creation and
/// never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Obelisk,
}

/// A single tile of a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: i64,
    pub y: i64,
    #[serde(rename = "type")]
    pub kind: TileKind,
}

/// A connected (or once connected) player.
///
/// # Fields
///
/// * `fid` - The externally supplied identifier, unique per player
/// * `x`, `y` - Current position, unbounded in both directions
/// * `home` - Spawn coordinate, fixed at creation and equal to the space's home
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub fid: String,
    pub x: i64,
    pub y: i64,
    pub home: Coord,
}

/// The plot owned by one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Identifier of the owning player
    pub fid: String,

    /// Anchor of the plot, allocated by insertion order
    pub home: Coord,

    /// The 3x3 block of tiles centred on `home`
    pub tiles: Vec<Tile>,
}

/// A stored mail item.
///
/// Identifiers come from one process-wide counter, so they are unique across
/// all mailboxes and strictly increasing in send order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailItem {
    pub id: u64,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    /// Always `false`; read tracking is not implemented
    pub read: bool,
}

/// The caller-supplied part of a mail item.
///
/// Validation (non-empty `to` and `body`) is the caller's job; the world stores
/// whatever it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A transient notice queued for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: u64,
}

/// A player's own state plus every space within view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub player: Player,
    pub spaces: Vec<Space>,
}

/// Aggregate counters for health logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub players: usize,
    pub spaces: usize,
    pub mail_items: usize,
    pub pending_notifications: usize,
    pub last_mail_id: u64,
}
