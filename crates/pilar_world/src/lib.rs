//! # Pilar World
//!
//! The authoritative, process-lifetime world state shared by every connection
//! to the Pilar server. It owns four collections:
//!
//! * **Players** - one per identifier (fid), created lazily on first reference
//! * **Spaces** - the fixed 3x3 plot owned by each player, anchored at a home
//!   coordinate allocated by insertion order on an 8-column grid
//! * **Mailboxes** - unbounded, append-only, delivery-ordered mail per recipient
//! * **Notifications** - transient per-recipient queues drained on read
//!
//! There is no networking or framing here. [`World`] is the plain state machine
//! with `&mut self` mutations; [`WorldStore`] is the shared handle the server
//! hands to every connection task, serializing all access behind one lock.
//!
//! ## Example
//!
//! ```rust
//! use pilar_world::{World, NewMail};
//!
//! let mut world = World::new();
//! world.get_or_create_player("alice");
//! world.move_player("alice", 3, -2);
//!
//! let snapshot = world.snapshot("alice");
//! assert_eq!((snapshot.player.x, snapshot.player.y), (3, -2));
//!
//! world.send_mail(NewMail {
//!     from: "alice".into(),
//!     to: "bob".into(),
//!     subject: "hi".into(),
//!     body: "hello".into(),
//! });
//! assert_eq!(world.list_mail("bob").len(), 1);
//! assert_eq!(world.pop_notifications("bob")[0].text, "Mail from alice");
//! ```

pub mod store;
pub mod types;
pub mod utils;
pub mod world;

pub use store::{MailDelivery, WorldStore};
pub use types::{
    Coord, MailItem, NewMail, Notification, Player, Snapshot, Space, Tile, TileKind, WorldStats,
};
pub use utils::current_timestamp_millis;
pub use world::{home_for_index, World, GRID_COLUMNS, HOME_SPACING, VIEW_RADIUS};
