//! Realtime wire format shared by the server and the client.
//!
//! Every frame is a single WebSocket text frame holding one JSON [`Envelope`]:
//!
//! ```text
//! {"event": "new_message", "data": {...}, "ack": 7}
//! ```
//!
//! An envelope that carries `ack` expects the peer to answer with an
//! [`event::ACK`] envelope carrying the same id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header carrying the user identity on the WebSocket handshake request
pub const USER_ID_HEADER: &str = "x-user-id";

/// Reserved event names
pub mod event {
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const CONNECT_ERROR: &str = "connect_error";
    pub const ERROR: &str = "error";
    pub const RECONNECT: &str = "reconnect";
    pub const RECONNECT_ATTEMPT: &str = "reconnect_attempt";
    pub const RECONNECT_ERROR: &str = "reconnect_error";
    pub const RECONNECT_FAILED: &str = "reconnect_failed";
    pub const NEW_MESSAGE: &str = "new_message";
    pub const REGISTER: &str = "register";
    pub const ACK: &str = "ack";
    pub const SEND_MESSAGE: &str = "send_message";
}

/// One realtime frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            ack: None,
        }
    }

    /// Attach an acknowledgement id
    pub fn with_ack(mut self, ack: u64) -> Self {
        self.ack = Some(ack);
        self
    }

    /// Build the acknowledgement reply for an envelope with id `ack`
    pub fn ack_reply(ack: u64, data: Value) -> Self {
        Self::new(event::ACK, data).with_ack(ack)
    }

    pub fn is_ack(&self) -> bool {
        self.event == event::ACK && self.ack.is_some()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Payload of a `send_message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub to: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_without_ack_omits_field() {
        // テスト項目: ack を持たない Envelope は ack フィールドを出力しない
        // given (前提条件):
        let envelope = Envelope::new(event::REGISTER, json!("alice"));

        // when (操作):
        let text = envelope.to_json().unwrap();

        // then (期待する結果):
        assert_eq!(text, r#"{"event":"register","data":"alice"}"#);
    }

    #[test]
    fn test_envelope_missing_data_defaults_to_null() {
        // テスト項目: data が省略された JSON は null として読み込まれる
        // given (前提条件):
        let text = r#"{"event":"ping"}"#;

        // when (操作):
        let envelope = Envelope::from_json(text).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.event, "ping");
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.ack, None);
    }

    #[test]
    fn test_ack_reply_is_recognized() {
        // テスト項目: ack_reply で作った Envelope が ACK として判定される
        // given (前提条件):
        let reply = Envelope::ack_reply(7, json!({"delivered": true}));

        // when (操作):
        let parsed = Envelope::from_json(&reply.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert!(parsed.is_ack());
        assert_eq!(parsed.ack, Some(7));
        assert!(!Envelope::new(event::ACK, Value::Null).is_ack());
    }
}
