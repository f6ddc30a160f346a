//! Error types for the realtime client.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a single transport handshake or an established link.
///
/// These never stop the client on their own; the reconnection controller
/// decides what happens next.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Handshake timed out after {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Errors returned by the public `SocketService` operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocketError {
    /// `reconnect()` was called before any `connect()`
    #[error("No active session to reconnect")]
    NoActiveSession,

    /// Emit while the connection is not `Connected`; the frame is dropped
    #[error("Not connected")]
    NotConnected,

    #[error("Acknowledgement timed out after {0:?}")]
    AckTimeout(Duration),

    /// The connection went away before the peer acknowledged
    #[error("Acknowledgement dropped")]
    AckDropped,

    #[error("Failed to encode payload: {0}")]
    Encode(String),
}

/// Failure reported by one subscriber callback
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Subscriber failed: {0}")]
    Failed(String),

    #[error("Subscriber panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
