//! The world state machine.
//!
//! [`World`] holds every player, space, mailbox and notification queue and
//! exposes the pure query/mutation operations the server dispatches to. It is
//! synchronous and lock-free; sharing it between connections is
//! the job of [`crate::WorldStore`].

use crate::types::{
    Coord, MailItem, NewMail, Notification, Player, Snapshot, Space, Tile, TileKind, WorldStats,
};
use crate::utils::current_timestamp_millis;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Distance between neighbouring home coordinates on both axes.
pub const HOME_SPACING: i64 = 24;

/// Number of home slots per grid row.
pub const GRID_COLUMNS: usize = 8;

/// Per-axis visibility threshold used by snapshots.
pub const VIEW_RADIUS: u64 = 40;

/// Returns the home coordinate for the `index`-th allocated space.
///
/// Slots fill row by row: column `index % 8`, row `index / 8`, each spaced by
/// [`HOME_SPACING`]. Distinct indices always map to distinct coordinates.
pub fn home_for_index(index: usize) -> Coord {
    let column = (index % GRID_COLUMNS) as i64;
    let row = (index / GRID_COLUMNS) as i64;
    Coord::new(column * HOME_SPACING, row * HOME_SPACING)
}

/// Builds the 3x3 block of obelisk tiles centred on `home`.
fn obelisk_tiles(home: Coord) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(9);
    for dx in -1..=1 {
        for dy in -1..=1 {
            tiles.push(Tile {
                x: home.x + dx,
                y: home.y + dy,
                kind: TileKind::Obelisk,
            });
        }
    }
    tiles
}

/// Authoritative in-memory world.
///
/// Nothing is ever removed except drained notifications: players, spaces and
/// mail live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct World {
    players: HashMap<String, Player>,

    /// Spaces in allocation order; the position doubles as the slot index
    spaces: Vec<Space>,
    space_index: HashMap<String, usize>,

    mailboxes: HashMap<String, Vec<MailItem>>,
    notifications: HashMap<String, Vec<Notification>>,

    /// Last issued mail id (0 means none issued yet)
    last_mail_id: u64,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the player for `fid`, creating it and its space if absent.
    ///
    /// A new player spawns at the home of a freshly allocated slot. Creation
    /// is idempotent: a second call for the same `fid` returns the existing
    /// player untouched.
    ///
    /// # Arguments
    ///
    /// * `fid` - The player identifier; callers reject empty identifiers
    pub fn get_or_create_player(&mut self, fid: &str) -> &Player {
        self.player_entry(fid)
    }

    /// Mutable access to the player for `fid`, allocating player and space
    /// together when the identifier is new.
    fn player_entry(&mut self, fid: &str) -> &mut Player {
        match self.players.entry(fid.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let index = self.spaces.len();
                let home = home_for_index(index);

                self.spaces.push(Space {
                    fid: fid.to_string(),
                    home,
                    tiles: obelisk_tiles(home),
                });
                self.space_index.insert(fid.to_string(), index);

                debug!("🏠 Allocated slot {} at ({}, {}) for {}", index, home.x, home.y, fid);
                entry.insert(Player {
                    fid: fid.to_string(),
                    x: home.x,
                    y: home.y,
                    home,
                })
            }
        }
    }

    /// Looks up a player without creating it.
    pub fn player(&self, fid: &str) -> Option<&Player> {
        self.players.get(fid)
    }

    /// Looks up the space owned by `fid` without creating it.
    pub fn space(&self, fid: &str) -> Option<&Space> {
        self.space_index.get(fid).map(|&index| &self.spaces[index])
    }

    /// Adds `(dx, dy)` to the player's position, creating the player first if
    /// needed.
    ///
    /// No bounds or collision checks are applied. Arithmetic saturates at the
    /// `i64` limits instead of overflowing.
    pub fn move_player(&mut self, fid: &str, dx: i64, dy: i64) -> &Player {
        let player = self.player_entry(fid);
        player.x = player.x.saturating_add(dx);
        player.y = player.y.saturating_add(dy);
        player
    }

    /// Returns the player's state and every space within [`VIEW_RADIUS`].
    ///
    /// Creates the player if it does not exist yet.
    pub fn snapshot(&mut self, fid: &str) -> Snapshot {
        let player = self.get_or_create_player(fid).clone();
        let spaces = self
            .list_nearby_spaces(Coord::new(player.x, player.y), VIEW_RADIUS)
            .into_iter()
            .cloned()
            .collect();
        Snapshot { player, spaces }
    }

    /// Lists the spaces whose home lies within `radius` of `center` on each
    /// axis independently.
    ///
    /// This is an axis-aligned box test, inclusive at the boundary:
    /// `|home.x - center.x| <= radius && |home.y - center.y| <= radius`.
    /// Results keep allocation order.
    pub fn list_nearby_spaces(&self, center: Coord, radius: u64) -> Vec<&Space> {
        self.spaces
            .iter()
            .filter(|space| {
                space.home.x.abs_diff(center.x) <= radius
                    && space.home.y.abs_diff(center.y) <= radius
            })
            .collect()
    }

    /// Stores a mail item in the recipient's mailbox and queues a
    /// `"Mail from <sender>"` notification for the recipient.
    ///
    /// # Returns
    ///
    /// The stored item, carrying the newly assigned id.
    pub fn send_mail(&mut self, mail: NewMail) -> MailItem {
        self.last_mail_id += 1;

        let item = MailItem {
            id: self.last_mail_id,
            from: mail.from,
            to: mail.to,
            subject: mail.subject,
            body: mail.body,
            created_at: current_timestamp_millis(),
            read: false,
        };

        self.mailboxes
            .entry(item.to.clone())
            .or_default()
            .push(item.clone());

        let text = format!("Mail from {}", item.from);
        self.add_notification(&item.to, text);

        debug!("✉️ Mail {} stored: {} -> {}", item.id, item.from, item.to);
        item
    }

    /// Returns the mailbox of `fid` in delivery order.
    pub fn list_mail(&self, fid: &str) -> &[MailItem] {
        self.mailboxes
            .get(fid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Queues a notification for `fid`.
    pub fn add_notification(&mut self, fid: &str, text: impl Into<String>) {
        self.notifications
            .entry(fid.to_string())
            .or_default()
            .push(Notification {
                text: text.into(),
                created_at: current_timestamp_millis(),
            });
    }

    /// Returns and clears the notification queue of `fid`.
    ///
    /// Delivery is at-most-once: whatever is returned here is gone from the
    /// world, whether or not the caller manages to deliver it.
    pub fn pop_notifications(&mut self, fid: &str) -> Vec<Notification> {
        self.notifications.remove(fid).unwrap_or_default()
    }

    /// The id given to the most recent mail, or 0 if none was sent.
    pub fn last_mail_id(&self) -> u64 {
        self.last_mail_id
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            players: self.players.len(),
            spaces: self.spaces.len(),
            mail_items: self.mailboxes.values().map(Vec::len).sum(),
            pending_notifications: self.notifications.values().map(Vec::len).sum(),
            last_mail_id: self.last_mail_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn mail(from: &str, to: &str, body: &str) -> NewMail {
        NewMail {
            from: from.to_string(),
            to: to.to_string(),
            subject: String::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_home_packing_follows_grid_formula() {
        let mut world = World::new();
        let mut seen = HashSet::new();

        for index in 0..20 {
            let fid = format!("player-{index}");
            let home = world.get_or_create_player(&fid).home;

            assert_eq!(home.x, (index % 8) as i64 * 24);
            assert_eq!(home.y, (index / 8) as i64 * 24);
            assert!(seen.insert(home), "home {home:?} allocated twice");
        }
    }

    #[test]
    fn test_second_player_lands_in_second_column() {
        let mut world = World::new();
        assert_eq!(world.get_or_create_player("alice").home, Coord::new(0, 0));
        assert_eq!(world.get_or_create_player("bob").home, Coord::new(24, 0));
    }

    #[test]
    fn test_ninth_player_starts_a_new_row() {
        assert_eq!(home_for_index(7), Coord::new(168, 0));
        assert_eq!(home_for_index(8), Coord::new(0, 24));
        assert_eq!(home_for_index(17), Coord::new(24, 48));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut world = World::new();
        let first = world.get_or_create_player("alice").clone();
        world.get_or_create_player("bob");
        let second = world.get_or_create_player("alice").clone();

        assert_eq!(first, second);
        assert_eq!(world.stats().players, 2);
        assert_eq!(world.stats().spaces, 2);
    }

    #[test]
    fn test_player_and_space_are_created_together() {
        let mut world = World::new();
        let player = world.get_or_create_player("carol").clone();
        let space = world.space("carol").expect("space should exist");

        assert_eq!(space.home, player.home);
        assert_eq!((player.x, player.y), (player.home.x, player.home.y));
        assert_eq!(space.tiles.len(), 9);
        assert!(space.tiles.iter().all(|t| t.kind == TileKind::Obelisk));
        assert!(space
            .tiles
            .iter()
            .all(|t| (t.x - space.home.x).abs() <= 1 && (t.y - space.home.y).abs() <= 1));
    }

    #[test]
    fn test_move_applies_deltas_without_clamping() {
        let mut world = World::new();
        world.get_or_create_player("alice");
        world.move_player("alice", -500, 7);
        world.move_player("alice", 3, -1000);

        let snapshot = world.snapshot("alice");
        assert_eq!((snapshot.player.x, snapshot.player.y), (-497, -993));
        assert_eq!(snapshot.player.home, Coord::new(0, 0));
    }

    #[test]
    fn test_move_creates_unknown_player() {
        let mut world = World::new();
        let player = world.move_player("ghost", 1, 2).clone();
        assert_eq!((player.x, player.y), (1, 2));
        assert!(world.space("ghost").is_some());
    }

    #[test]
    fn test_nearby_spaces_boundary_is_inclusive() {
        let mut world = World::new();
        world.get_or_create_player("anchor"); // home (0, 0)

        let radius = VIEW_RADIUS as i64;
        for (x, y, visible) in [
            (radius, 0, true),
            (-radius, 0, true),
            (0, radius, true),
            (radius, radius, true),
            (radius + 1, 0, false),
            (0, -(radius + 1), false),
            (radius + 1, radius + 1, false),
        ] {
            let found = world.list_nearby_spaces(Coord::new(x, y), VIEW_RADIUS);
            assert_eq!(
                found.iter().any(|s| s.fid == "anchor"),
                visible,
                "unexpected visibility from ({x}, {y})"
            );
        }
    }

    #[test]
    fn test_nearby_spaces_use_box_not_circle() {
        let mut world = World::new();
        world.get_or_create_player("anchor");

        // (40, 40) is ~56.6 away in Euclidean terms but inside the box
        let found = world.list_nearby_spaces(Coord::new(40, 40), VIEW_RADIUS);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_snapshot_lists_neighbours_in_allocation_order() {
        let mut world = World::new();
        for fid in ["a", "b", "c", "d"] {
            world.get_or_create_player(fid);
        }
        // a(0,0) b(24,0) c(48,0) d(72,0), viewed from a
        let snapshot = world.snapshot("a");
        let fids: Vec<_> = snapshot.spaces.iter().map(|s| s.fid.as_str()).collect();
        assert_eq!(fids, vec!["a", "b"]);
    }

    #[test]
    fn test_mail_ids_increase_across_recipients() {
        let mut world = World::new();
        let first = world.send_mail(mail("alice", "bob", "one"));
        let second = world.send_mail(mail("bob", "alice", "two"));
        let third = world.send_mail(mail("carol", "bob", "three"));

        assert_eq!((first.id, second.id, third.id), (1, 2, 3));
        assert_eq!(world.last_mail_id(), 3);

        let bob_ids: Vec<_> = world.list_mail("bob").iter().map(|m| m.id).collect();
        assert_eq!(bob_ids, vec![1, 3]);
        assert!(world.list_mail("alice").iter().all(|m| !m.read));
    }

    #[test]
    fn test_mail_to_unseen_recipient_does_not_create_player() {
        let mut world = World::new();
        world.send_mail(mail("alice", "nobody-yet", "hello"));

        assert_eq!(world.list_mail("nobody-yet").len(), 1);
        assert!(world.player("nobody-yet").is_none());
    }

    #[test]
    fn test_list_mail_of_unknown_fid_is_empty() {
        let world = World::new();
        assert!(world.list_mail("nobody").is_empty());
    }

    #[test]
    fn test_notifications_drain_once() {
        let mut world = World::new();
        world.send_mail(mail("alice", "bob", "hello"));
        world.send_mail(mail("carol", "bob", "hey"));

        let first = world.pop_notifications("bob");
        let texts: Vec<_> = first.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["Mail from alice", "Mail from carol"]);

        assert!(world.pop_notifications("bob").is_empty());
        // the mailbox itself is untouched by draining
        assert_eq!(world.list_mail("bob").len(), 2);
    }

    #[test]
    fn test_stats_count_everything() {
        let mut world = World::new();
        world.get_or_create_player("alice");
        world.send_mail(mail("alice", "bob", "hello"));

        let stats = world.stats();
        assert_eq!(stats.players, 1);
        assert_eq!(stats.spaces, 1);
        assert_eq!(stats.mail_items, 1);
        assert_eq!(stats.pending_notifications, 1);
        assert_eq!(stats.last_mail_id, 1);
    }

    #[test]
    fn test_snapshot_serializes_to_wire_shape() {
        let mut world = World::new();
        let value = serde_json::to_value(world.snapshot("alice")).unwrap();

        assert_eq!(value["player"]["fid"], "alice");
        assert_eq!(value["player"]["home"]["x"], 0);
        assert_eq!(value["spaces"][0]["tiles"][0]["type"], "obelisk");
        assert_eq!(value["spaces"][0]["tiles"][0]["x"], -1);
    }
}
