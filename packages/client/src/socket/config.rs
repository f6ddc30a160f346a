use std::time::Duration;

use super::reconnect::ReconnectPolicy;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

/// Settings for a `SocketService`
///
/// The service owns reconnection: each handshake is a single attempt bounded
/// by `connect_timeout`, and retries are driven by `reconnect`.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Pause between the disconnect and the new handshake of a manual `reconnect()`
    pub reconnect_grace: Duration,
    pub ack_timeout: Duration,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
            reconnect_grace: Duration::from_secs(1),
            ack_timeout: Duration::from_secs(10),
        }
    }
}
