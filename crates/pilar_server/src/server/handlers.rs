//! Connection handling logic for WebSocket clients.
//!
//! This module contains the core connection handling logic that manages
//! the lifecycle of individual client connections, including WebSocket
//! handshaking, message processing, and cleanup.

use crate::{
    connection::{ConnectionId, ConnectionManager},
    error::{ProtocolError, ServerError},
    messaging::{route_client_message, ServerMessage},
};
use futures::{SinkExt, StreamExt};
use pilar_world::WorldStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, trace};

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform WebSocket handshake
/// 2. Register the connection (unjoined) with the connection manager
/// 3. Run the incoming and outgoing tasks until either finishes
/// 4. Remove the connection, which drops its session binding
///
/// # Arguments
///
/// * `stream` - The TCP stream for the client connection
/// * `addr` - The remote address of the client
/// * `connection_manager` - Session registry and delivery
/// * `world` - The shared world store
/// * `max_message_size` - Messages longer than this are answered with `bad_json`
///
/// # Message Handling
///
/// * **Incoming Task**: decodes and routes client frames; every rejection is
///   answered with an `error` message on the same connection
/// * **Outgoing Task**: drains the connection's queue into the socket
///
/// Closing the connection is never an error.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    world: WorldStore,
    max_message_size: usize,
) -> Result<(), ServerError> {
    // Perform WebSocket handshake
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));

    let (outbox, mut outbox_receiver) = mpsc::unbounded_channel::<String>();
    let connection_id = connection_manager.add_connection(addr, outbox).await;

    let ws_sender_incoming = ws_sender.clone();
    let ws_sender_outgoing = ws_sender;

    // Incoming message task - decodes frames and routes them to the world
    let incoming_task = {
        let connection_manager = connection_manager.clone();

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        process_text(&text, connection_id, &connection_manager, &world, max_message_size).await;
                    }
                    Ok(Message::Binary(data)) => {
                        let text = String::from_utf8_lossy(&data);
                        process_text(&text, connection_id, &connection_manager, &world, max_message_size).await;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender_incoming.lock().await;
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Err(e) => {
                        debug!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Outgoing message task
    let outgoing_task = async move {
        while let Some(text) = outbox_receiver.recv().await {
            let mut ws_sender = ws_sender_outgoing.lock().await;
            if let Err(e) = ws_sender.send(Message::text(text)).await {
                error!("Failed to send message to connection {}: {}", connection_id, e);
                break;
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    connection_manager.remove_connection(connection_id).await;
    Ok(())
}

/// Routes one text frame and answers any rejection on the same connection.
async fn process_text(
    text: &str,
    connection_id: ConnectionId,
    connection_manager: &ConnectionManager,
    world: &WorldStore,
    max_message_size: usize,
) {
    trace!("📥 Connection {} sent {} bytes", connection_id, text.len());

    let result = if text.len() > max_message_size {
        Err(ProtocolError::BadJson)
    } else {
        route_client_message(text, connection_id, connection_manager, world).await
    };

    if let Err(e) = result {
        debug!("❌ Rejected message on connection {}: {}", connection_id, e.code());
        connection_manager
            .send_to_connection(connection_id, &ServerMessage::error(e))
            .await;
    }
}
