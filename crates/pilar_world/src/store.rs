//! Shared, lock-guarded access to the world.
//!
//! Every connection task holds a clone of the same [`WorldStore`]. All
//! operations take one coarse `tokio::sync::Mutex`, which is what keeps home
//! slot allocation, mail id allocation and notification draining race-free.

use crate::types::{MailItem, NewMail, Notification, Player, Snapshot, WorldStats};
use crate::world::World;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a mail send produces, captured under a single lock.
#[derive(Debug, Clone)]
pub struct MailDelivery {
    /// The stored item with its assigned id
    pub item: MailItem,

    /// The sender's own mailbox after the send
    pub sender_mailbox: Vec<MailItem>,

    /// The recipient's mailbox after the send
    pub recipient_mailbox: Vec<MailItem>,

    /// The recipient's drained notification queue
    pub recipient_notifications: Vec<Notification>,
}

/// Cloneable handle to the single authoritative [`World`].
#[derive(Debug, Clone, Default)]
pub struct WorldStore {
    inner: Arc<Mutex<World>>,
}

impl WorldStore {
    /// Creates a store around an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing world.
    pub fn from_world(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Runs `f` with exclusive access to the world.
    ///
    /// Use this for compound operations that must observe a consistent state.
    /// Keep `f` short: every connection waits on the same lock.
    pub async fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        let mut world = self.inner.lock().await;
        f(&mut world)
    }

    pub async fn get_or_create_player(&self, fid: &str) -> Player {
        self.with(|world| world.get_or_create_player(fid).clone()).await
    }

    pub async fn move_player(&self, fid: &str, dx: i64, dy: i64) -> Player {
        self.with(|world| world.move_player(fid, dx, dy).clone()).await
    }

    pub async fn snapshot(&self, fid: &str) -> Snapshot {
        self.with(|world| world.snapshot(fid)).await
    }

    pub async fn send_mail(&self, mail: NewMail) -> MailItem {
        self.with(|world| world.send_mail(mail)).await
    }

    pub async fn list_mail(&self, fid: &str) -> Vec<MailItem> {
        self.with(|world| world.list_mail(fid).to_vec()).await
    }

    pub async fn pop_notifications(&self, fid: &str) -> Vec<Notification> {
        self.with(|world| world.pop_notifications(fid)).await
    }

    /// Reads the mailbox of `fid` and drains its notifications atomically.
    pub async fn mailbox_with_notifications(&self, fid: &str) -> (Vec<MailItem>, Vec<Notification>) {
        self.with(|world| {
            let mailbox = world.list_mail(fid).to_vec();
            let notifications = world.pop_notifications(fid);
            (mailbox, notifications)
        })
        .await
    }

    /// Stores `mail` and collects both mailboxes plus the recipient's drained
    /// notifications in one critical section.
    ///
    /// The recipient's queue is drained whether or not anyone is connected to
    /// receive it; the mailbox remains the durable record.
    pub async fn deliver_mail(&self, mail: NewMail) -> MailDelivery {
        self.with(|world| {
            let item = world.send_mail(mail);
            let sender_mailbox = world.list_mail(&item.from).to_vec();
            let recipient_mailbox = world.list_mail(&item.to).to_vec();
            let recipient_notifications = world.pop_notifications(&item.to);
            MailDelivery {
                item,
                sender_mailbox,
                recipient_mailbox,
                recipient_notifications,
            }
        })
        .await
    }

    pub async fn stats(&self) -> WorldStats {
        self.with(|world| world.stats()).await
    }
}
