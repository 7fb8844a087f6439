//! Message routing logic for dispatching client messages to the world.
//!
//! Each connection is a two-state machine, **unjoined** and **joined**,
//! where the state is simply whether the [`ConnectionManager`] has an
//! identifier bound to the connection:
//!
//! | state    | message     | effect                                                   |
//! |----------|-------------|----------------------------------------------------------|
//! | any      | `hello`     | bind fid, push state, mailbox, pending notifications     |
//! | unjoined | anything    | `not_joined`                                             |
//! | joined   | `move`      | apply delta, push state to this connection               |
//! | joined   | `mail_send` | store, push sender mailbox, push recipient mailbox/notify |
//! | joined   | `mail_list` | push mailbox and pending notifications                   |
//! | joined   | unknown     | ignored                                                  |
//!
//! Notify pushes only happen when the drained list is non-empty. Drained
//! notifications are delivered at most once; if no connection is joined as
//! the recipient they are lost, while the mail itself stays in the mailbox.

use crate::{
    connection::{ConnectionId, ConnectionManager},
    error::ProtocolError,
    messaging::{decode_client_message, ClientMessage, ServerMessage},
};
use pilar_world::{MailItem, NewMail, Notification, WorldStore};
use tracing::{debug, trace};

/// Routes a raw client message through the connection state machine.
///
/// Responses are queued on the connection manager; nothing is returned to
/// the caller except a rejection.
///
/// # Arguments
///
/// * `text` - The raw message text from the client (expected to be JSON)
/// * `connection_id` - The unique identifier for the client connection
/// * `connection_manager` - Session registry used for lookups and delivery
/// * `world` - The shared world store
///
/// # Returns
///
/// `Ok(())` if the message was handled or deliberately ignored, or the
/// `ProtocolError` the caller should report back to the connection.
pub async fn route_client_message(
    text: &str,
    connection_id: ConnectionId,
    connection_manager: &ConnectionManager,
    world: &WorldStore,
) -> Result<(), ProtocolError> {
    let message = decode_client_message(text)?;

    if let Some(ClientMessage::Join { fid }) = message {
        return handle_join(fid, connection_id, connection_manager, world).await;
    }

    let fid = connection_manager
        .get_fid(connection_id)
        .await
        .ok_or(ProtocolError::NotJoined)?;

    let Some(message) = message else {
        trace!("🤷 Ignoring unknown message kind from {} on connection {}", fid, connection_id);
        return Ok(());
    };

    debug!("📨 Routing {:?} from {} on connection {}", message, fid, connection_id);

    match message {
        ClientMessage::Join { .. } => Ok(()),
        ClientMessage::Move { dx, dy } => {
            let snapshot = world
                .with(|world| {
                    world.move_player(&fid, dx, dy);
                    world.snapshot(&fid)
                })
                .await;
            connection_manager
                .send_to_connection(connection_id, &ServerMessage::State { data: snapshot })
                .await;
            Ok(())
        }
        ClientMessage::MailSend { to, subject, body } => {
            if to.is_empty() || body.is_empty() {
                return Err(ProtocolError::BadMail);
            }

            let delivery = world
                .deliver_mail(NewMail {
                    from: fid,
                    to,
                    subject,
                    body,
                })
                .await;
            let to = delivery.item.to.as_str();

            connection_manager
                .send_to_connection(
                    connection_id,
                    &ServerMessage::Mail {
                        items: delivery.sender_mailbox,
                    },
                )
                .await;

            let reached = connection_manager
                .send_to_fid(
                    to,
                    &ServerMessage::Mail {
                        items: delivery.recipient_mailbox,
                    },
                )
                .await;
            if !delivery.recipient_notifications.is_empty() {
                connection_manager
                    .send_to_fid(
                        to,
                        &ServerMessage::Notify {
                            items: delivery.recipient_notifications,
                        },
                    )
                    .await;
            }

            debug!(
                "✉️ Mail {} from {} to {} pushed to {} live connection(s)",
                delivery.item.id, delivery.item.from, to, reached
            );
            Ok(())
        }
        ClientMessage::MailList => {
            let (mailbox, notifications) = world.mailbox_with_notifications(&fid).await;
            push_mailbox(connection_id, connection_manager, mailbox, notifications).await;
            Ok(())
        }
    }
}

/// Binds the connection to `fid` and pushes the initial state.
async fn handle_join(
    fid: String,
    connection_id: ConnectionId,
    connection_manager: &ConnectionManager,
    world: &WorldStore,
) -> Result<(), ProtocolError> {
    if fid.is_empty() {
        return Err(ProtocolError::MissingFid);
    }

    connection_manager.join(connection_id, &fid).await;

    let (snapshot, mailbox, notifications) = world
        .with(|world| {
            let snapshot = world.snapshot(&fid);
            let mailbox = world.list_mail(&fid).to_vec();
            let notifications = world.pop_notifications(&fid);
            (snapshot, mailbox, notifications)
        })
        .await;

    connection_manager
        .send_to_connection(connection_id, &ServerMessage::State { data: snapshot })
        .await;
    push_mailbox(connection_id, connection_manager, mailbox, notifications).await;
    Ok(())
}

async fn push_mailbox(
    connection_id: ConnectionId,
    connection_manager: &ConnectionManager,
    mailbox: Vec<MailItem>,
    notifications: Vec<Notification>,
) {
    connection_manager
        .send_to_connection(connection_id, &ServerMessage::Mail { items: mailbox })
        .await;
    if !notifications.is_empty() {
        connection_manager
            .send_to_connection(
                connection_id,
                &ServerMessage::Notify {
                    items: notifications,
                },
            )
            .await;
    }
}
