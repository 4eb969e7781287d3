// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket side of the front door.
//!
//! Each text frame is handed to every registered [`WebSocketListener`];
//! replies go back on the connection the frame arrived on.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures::{SinkExt, StreamExt, future::join_all};
use lumen_core::{WebSocketListener, WebSocketMessage};
use tokio::sync::mpsc;

use crate::front_door::ListenerSource;

/// Completes the upgrade and spawns the connection handler.
pub fn accept(
    upgrade: WebSocketUpgrade,
    listeners: ListenerSource,
    remote_addr: Option<SocketAddr>,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, listeners, remote_addr))
}

/// Runs every listener on one frame concurrently and collects the replies.
///
/// A failing listener is logged and does not affect the others.
pub async fn dispatch(
    listeners: &[Arc<dyn WebSocketListener>],
    message: &WebSocketMessage,
) -> Vec<String> {
    let results = join_all(
        listeners
            .iter()
            .map(|listener| async move { (listener.name(), listener.process_message(message).await) }),
    )
    .await;

    results
        .into_iter()
        .filter_map(|(name, result)| match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(listener = name, error = %e, "websocket listener failed");
                None
            }
        })
        .collect()
}

async fn handle_socket(socket: WebSocket, listeners: ListenerSource, remote_addr: Option<SocketAddr>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(connection = %connection_id, "websocket connected");

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let sender_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            if ws_sender.send(Message::Text(reply.into())).await.is_err() {
                break;
            }
        }
    });

    'frames: while let Some(Ok(frame)) = ws_receiver.next().await {
        match frame {
            Message::Text(text) => {
                let message = WebSocketMessage {
                    connection_id: connection_id.clone(),
                    remote_addr: remote_addr.map(|a| a.to_string()),
                    text: text.as_str().to_owned(),
                };
                let current = listeners();
                for reply in dispatch(&current, &message).await {
                    if tx.send(reply).await.is_err() {
                        break 'frames;
                    }
                }
            }
            Message::Close(_) => break,
            // Binary frames are not part of the protocol; ping/pong is handled below us.
            _ => {}
        }
    }

    drop(tx);
    let _ = sender_task.await;
    tracing::debug!(connection = %connection_id, "websocket closed");
}
