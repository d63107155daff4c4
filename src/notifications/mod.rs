use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::Sender;
use tokio_stream::wrappers::BroadcastStream;

use crate::models::OrderEvent;

/// Pushes order lifecycle events out to WebSocket clients. Each socket gets
/// its own broadcast subscription; slow clients miss events rather than
/// blocking the engine.
pub struct NotificationHub;

impl NotificationHub {
    pub async fn handle_socket(socket: WebSocket, sender: Sender<OrderEvent>) {
        let (mut sender_ws, mut receiver) = socket.split();
        let mut event_stream = BroadcastStream::new(sender.subscribe());

        let mut send_task = tokio::spawn(async move {
            while let Some(Ok(event)) = event_stream.next().await {
                if let Ok(json) = serde_json::to_string(&event) {
                    if sender_ws.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
            }
        });

        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(_)) = receiver.next().await {
                // Clients only listen; inbound frames are drained and dropped.
            }
        });

        // If either task completes, cancel both
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }
    }
}
