use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::utils::state::AppState;

#[derive(Deserialize)]
struct SubscribeMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// GET /api/ws
pub async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The first text frame must be `{"type":"subscribe","sessionId":...}`. The
/// connection is then bound to that session for its whole life and receives
/// every matching progress event. Dropping the socket drops the subscription.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    let mut subscription = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<SubscribeMessage>(&text) {
                    Ok(msg) if msg.kind == "subscribe" => {
                        tracing::debug!(session_id = %msg.session_id, "websocket subscribed");
                        break state.progress.subscribe(&msg.session_id);
                    }
                    _ => {
                        let error = json!({ "error": "expected a subscribe message" }).to_string();
                        let _ = sink.send(Message::Text(error.into())).await;
                        return;
                    }
                }
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(_)) | Some(Err(_)) | None => return,
        }
    };

    loop {
        tokio::select! {
            event = subscription.next_event() => {
                let Some(event) = event else { return };
                let Ok(payload) = serde_json::to_string(&event) else { return };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    return;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }
}
