use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use checkin_types::events::DirectoryEvent;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

fn encode(event: &DirectoryEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            warn!("Failed to encode directory event: {}", e);
            None
        }
    }
}

/// Serve one check-in view: `Ready`, then every directory event until the
/// socket closes or stops answering pings. Clients only listen; anything
/// they send besides Pong/Close is ignored.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before Ready so no change between the two is missed
    let mut broadcast_rx = dispatcher.subscribe();

    let Some(ready) = encode(&DirectoryEvent::Ready) else {
        return;
    };
    if sender.send(ready).await.is_err() {
        return;
    }

    let conn_id = dispatcher.viewer_connected().await;
    info!(
        "Viewer {} connected ({} open)",
        conn_id,
        dispatcher.viewer_count().await
    );

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            // Events only mean "re-fetch"; the next one will do
                            warn!("Viewer {} lagged by {} events", conn_id, n);
                            continue;
                        }
                        Err(_) => break,
                    };

                    let Some(msg) = encode(&event) else { continue };
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping viewer {}", missed_heartbeats, conn_id);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                Message::Text(text) => {
                    debug!("Viewer {} sent unexpected text ({} bytes)", conn_id, text.as_str().len());
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.viewer_disconnected(conn_id).await;
    info!("Viewer {} disconnected", conn_id);
}
