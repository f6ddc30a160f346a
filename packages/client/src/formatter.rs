//! Message formatting utilities for client display.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use terakoya_shared::time::to_local_rfc3339;

use crate::socket::ConnectionState;

const RULE: &str = "------------------------------------------------------------";

/// Payload of a `new_message` event as pushed by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomingMessage {
    Direct {
        from: String,
        content: String,
        sent_at: DateTime<Utc>,
    },
    DeadlineReminder {
        quiz_id: String,
        title: String,
        close_date: DateTime<Utc>,
    },
}

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any `new_message` payload, falling back to raw JSON
    pub fn format_new_message(payload: &Value) -> String {
        match serde_json::from_value::<IncomingMessage>(payload.clone()) {
            Ok(IncomingMessage::Direct {
                from,
                content,
                sent_at,
            }) => Self::format_direct_message(&from, &content, sent_at),
            Ok(IncomingMessage::DeadlineReminder {
                quiz_id,
                title,
                close_date,
            }) => Self::format_deadline_reminder(&quiz_id, &title, close_date),
            Err(_) => Self::format_raw_message(payload),
        }
    }

    /// Format a direct message
    ///
    /// # Arguments
    ///
    /// * `from` - The user ID of the sender
    /// * `content` - The message content
    /// * `sent_at` - When the server relayed the message
    pub fn format_direct_message(from: &str, content: &str, sent_at: DateTime<Utc>) -> String {
        format!(
            "\n\n{RULE}\n@{}: {}\nsent at {}\n{RULE}\n",
            from,
            content,
            to_local_rfc3339(sent_at)
        )
    }

    /// Format a deadline reminder
    pub fn format_deadline_reminder(
        quiz_id: &str,
        title: &str,
        close_date: DateTime<Utc>,
    ) -> String {
        format!(
            "\n\n{RULE}\n! Quiz '{}' ({}) closes at {}\n  Your attempt is still in progress.\n{RULE}\n",
            title,
            quiz_id,
            to_local_rfc3339(close_date)
        )
    }

    /// Format a payload that is not a known notification
    pub fn format_raw_message(payload: &Value) -> String {
        format!("\n← Received: {}\n", payload)
    }

    pub fn format_state(state: ConnectionState) -> String {
        format!("\n* connection {}\n", state.label())
    }

    /// Format the server's acknowledgement of a `send_message`
    pub fn format_delivery(to: &str, ack: &Value) -> String {
        match ack.get("delivered").and_then(Value::as_bool) {
            Some(true) => format!("delivered to @{}\n", to),
            _ => match ack.get("error").and_then(Value::as_str) {
                Some(error) => format!("not delivered to @{}: {}\n", to, error),
                None => format!("@{} is offline, message not delivered\n", to),
            },
        }
    }

    pub fn format_help() -> String {
        "\nCommands:\n  @user message   send a direct message\n  /reconnect      reconnect now\n  /quit           disconnect and exit\n".to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_direct_message() {
        // テスト項目: ダイレクトメッセージが送信者・本文・送信時刻付きでフォーマットされる
        // given (前提条件):
        let payload = json!({
            "kind": "direct",
            "from": "alice",
            "content": "Hello, world!",
            "sent_at": "2023-01-01T12:00:00Z",
        });

        // when (操作):
        let result = MessageFormatter::format_new_message(&payload);

        // then (期待する結果):
        assert!(result.contains("@alice: Hello, world!"));
        assert!(result.contains("sent at"));
        assert!(result.contains("2023-01-01"));
        assert!(result.contains(RULE));
    }

    #[test]
    fn test_format_deadline_reminder() {
        // テスト項目: 締め切りリマインダーが Quiz 名と締め切り付きでフォーマットされる
        // given (前提条件):
        let close_date = Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap();

        // when (操作):
        let result = MessageFormatter::format_deadline_reminder("q1", "Algebra", close_date);

        // then (期待する結果):
        assert!(result.contains("Quiz 'Algebra' (q1) closes at"));
        assert!(result.contains("2024-04-02"));
        assert!(result.contains("still in progress"));
    }

    #[test]
    fn test_format_unknown_payload_as_raw() {
        // テスト項目: 未知の形式のペイロードは生の JSON として表示される
        // given (前提条件):
        let payload = json!({"kind": "poll", "question": "?"});

        // when (操作):
        let result = MessageFormatter::format_new_message(&payload);

        // then (期待する結果):
        assert!(result.contains("Received:"));
        assert!(result.contains("\"poll\""));
    }

    #[test]
    fn test_format_state() {
        // テスト項目: 接続状態がラベルでフォーマットされる
        // given (前提条件):
        let state = ConnectionState::Reconnecting;

        // when (操作):
        let result = MessageFormatter::format_state(state);

        // then (期待する結果):
        assert_eq!(result, "\n* connection reconnecting\n");
    }

    #[test]
    fn test_format_delivery_variants() {
        // テスト項目: 配信結果の ack が配信済み・オフライン・エラーで書き分けられる
        // given (前提条件):
        let delivered = json!({"delivered": true});
        let offline = json!({"delivered": false});
        let failed = json!({"delivered": false, "error": "Message content is empty"});

        // when (操作):
        let results = [
            MessageFormatter::format_delivery("bob", &delivered),
            MessageFormatter::format_delivery("bob", &offline),
            MessageFormatter::format_delivery("bob", &failed),
        ];

        // then (期待する結果):
        assert_eq!(results[0], "delivered to @bob\n");
        assert_eq!(results[1], "@bob is offline, message not delivered\n");
        assert_eq!(
            results[2],
            "not delivered to @bob: Message content is empty\n"
        );
    }
}
