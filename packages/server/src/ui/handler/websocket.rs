//! WebSocket (realtime channel) handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde_json::{Value, json};
use terakoya_shared::protocol::{Envelope, SendMessagePayload, USER_ID_HEADER, event};
use tokio::sync::mpsc;

use crate::{
    domain::{PusherChannel, UserId},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let raw_user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("WebSocket upgrade without '{}' header", USER_ID_HEADER);
            StatusCode::BAD_REQUEST
        })?;

    // Convert String -> UserId (Domain Model)
    let user_id = UserId::new(raw_user_id).map_err(|e| {
        tracing::warn!("Invalid user id '{}': {}", raw_user_id, e);
        StatusCode::BAD_REQUEST
    })?;

    tracing::info!("User '{}' opened realtime channel", user_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// All outbound traffic (pushed notifications and ack replies) goes through this single writer.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();

    let mut send_task = pusher_loop(rx, sender);

    let session_state = state.clone();
    let session_user = user_id.clone();
    let session_tx = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut registered = false;

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", session_user, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let envelope = match Envelope::from_json(&text) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            tracing::warn!("Malformed frame from '{}': {}", session_user, e);
                            continue;
                        }
                    };
                    if handle_envelope(&session_state, &session_user, &session_tx, envelope).await
                    {
                        registered = true;
                    }
                }
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", session_user);
                    break;
                }
                _ => {}
            }
        }

        registered
    });

    // If any one of the tasks completes, abort the other
    let registered = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or(false)
        }
        _ = &mut send_task => {
            recv_task.abort();
            true
        }
    };

    if registered {
        state.register_user_usecase.unregister(&user_id, &tx).await;
    }
}

/// Handle one inbound envelope. Returns `true` when the socket was registered.
async fn handle_envelope(
    state: &AppState,
    user_id: &UserId,
    tx: &PusherChannel,
    envelope: Envelope,
) -> bool {
    tracing::debug!("Received '{}' from '{}'", envelope.event, user_id);

    let mut registered = false;
    let reply = match envelope.event.as_str() {
        event::REGISTER => match envelope.data.as_str() {
            Some(claimed) if claimed == user_id.as_str() => {
                state.register_user_usecase.register(user_id.clone(), tx.clone()).await;
                registered = true;
                json!({"registered": true})
            }
            _ => {
                tracing::warn!(
                    "Register payload {} does not match connection user '{}'",
                    envelope.data,
                    user_id
                );
                json!({"registered": false})
            }
        },
        event::SEND_MESSAGE => {
            match serde_json::from_value::<SendMessagePayload>(envelope.data) {
                Ok(payload) => match state.send_message_usecase.execute(user_id, payload).await {
                    Ok(delivered) => json!({"delivered": delivered}),
                    Err(e) => {
                        tracing::warn!("Failed to relay message from '{}': {}", user_id, e);
                        json!({"delivered": false, "error": e.to_string()})
                    }
                },
                Err(e) => json!({"delivered": false, "error": e.to_string()}),
            }
        }
        _ => Value::Null,
    };

    if let Some(ack) = envelope.ack {
        match Envelope::ack_reply(ack, reply).to_json() {
            Ok(frame) => {
                let _ = tx.send(frame);
            }
            Err(e) => tracing::error!("Failed to encode ack for '{}': {}", user_id, e),
        }
    }

    registered
}
