//! Transport seam of the socket service.
//!
//! A [`Connector`] performs exactly one handshake per call and never retries;
//! retries belong to the reconnection controller.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use terakoya_shared::protocol::{Envelope, USER_ID_HEADER};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::HeaderValue,
        protocol::{CloseFrame, Message, frame::coding::CloseCode},
    },
};

use crate::error::TransportError;

/// What the link reports back to the connection driver
#[derive(Debug)]
pub enum TransportEvent {
    Frame(Envelope),
    Closed(String),
    Error(TransportError),
}

/// An established link.
///
/// Dropping every clone of `outbound` closes the connection.
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<Envelope>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, user_id: &str) -> Result<TransportLink, TransportError>;
}

/// WebSocket connector carrying the user id in the handshake header
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str, user_id: &str) -> Result<TransportLink, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let header = HeaderValue::from_str(user_id)
            .map_err(|e| TransportError::Protocol(format!("invalid user id header: {}", e)))?;
        request.headers_mut().insert(USER_ID_HEADER, header);

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!("WebSocket handshake with {} completed", url);

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Envelope>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // Writer: ends with a close frame once every outbound sender is gone
        let writer_events = inbound_tx.clone();
        tokio::spawn(async move {
            while let Some(envelope) = outbound_rx.recv().await {
                let json = match envelope.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize '{}': {}", envelope.event, e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to send frame: {}", e);
                    let _ = writer_events.send(TransportEvent::Error(TransportError::Protocol(
                        e.to_string(),
                    )));
                    return;
                }
            }
            let _ = write
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client disconnect".into(),
                })))
                .await;
        });

        // Reader
        tokio::spawn(async move {
            let event = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => match Envelope::from_json(text.as_str()) {
                        Ok(envelope) => {
                            if inbound_tx.send(TransportEvent::Frame(envelope)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Ignoring malformed frame: {}", e);
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.as_str().to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "server closed the connection".to_string());
                        break TransportEvent::Closed(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        break TransportEvent::Error(TransportError::Protocol(e.to_string()));
                    }
                    None => break TransportEvent::Closed("stream ended".to_string()),
                }
            };
            let _ = inbound_tx.send(event);
        });

        Ok(TransportLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
