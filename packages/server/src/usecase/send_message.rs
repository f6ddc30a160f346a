//! UseCase: ユーザー間メッセージの中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - `send_message` イベントを宛先ユーザーへの `new_message` として中継する処理
//!
//! ### どのような状況を想定しているか
//! - 正常系：宛先が接続中
//! - 宛先が未接続（delivered = false）
//! - 異常系：空のメッセージ、不正な宛先

use std::sync::Arc;

use terakoya_shared::{protocol::SendMessagePayload, time::Clock};

use crate::domain::{MessagePushError, MessagePusher, Notification, UserId};

use super::error::SendMessageError;

const MAX_CONTENT_LEN: usize = 2000;

/// メッセージ中継のユースケース
pub struct SendMessageUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            message_pusher,
            clock,
        }
    }

    /// メッセージを宛先に送る
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 宛先に届けた
    /// * `Ok(false)` - 宛先が接続していない
    /// * `Err(SendMessageError)` - 入力が不正、または送信に失敗
    pub async fn execute(
        &self,
        from: &UserId,
        payload: SendMessagePayload,
    ) -> Result<bool, SendMessageError> {
        let to = UserId::new(payload.to)?;
        let content = payload.content.trim().to_string();
        if content.is_empty() {
            return Err(SendMessageError::EmptyContent);
        }
        let len = content.chars().count();
        if len > MAX_CONTENT_LEN {
            return Err(SendMessageError::ContentTooLong(len));
        }

        let notification = Notification::Direct {
            from: from.clone(),
            content,
            sent_at: self.clock.now(),
        };

        match self.message_pusher.push_to(&to, &notification).await {
            Ok(()) => Ok(true),
            Err(MessagePushError::ClientNotFound(_)) => {
                tracing::debug!("Recipient '{}' is offline, message from '{}' dropped", to, from);
                Ok(false)
            }
            Err(e) => Err(SendMessageError::PushFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use terakoya_shared::{protocol::Envelope, time::FixedClock};
    use tokio::sync::mpsc;

    use super::*;
    use crate::{domain::ValueObjectError, infrastructure::message_pusher::WebSocketMessagePusher};

    fn create_usecase(pusher: Arc<WebSocketMessagePusher>) -> SendMessageUseCase {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap());
        SendMessageUseCase::new(pusher, Arc::new(clock))
    }

    fn payload(to: &str, content: &str) -> SendMessagePayload {
        SendMessagePayload {
            to: to.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_message_delivers_to_online_recipient() {
        // テスト項目: 接続中の宛先に new_message が届く
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(UserId::new("bob").unwrap(), tx).await;
        let usecase = create_usecase(pusher);
        let alice = UserId::new("alice").unwrap();

        // when (操作):
        let result = usecase.execute(&alice, payload("bob", "  see you at 9  ")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
        let envelope = Envelope::from_json(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(envelope.data["kind"], "direct");
        assert_eq!(envelope.data["from"], "alice");
        assert_eq!(envelope.data["content"], "see you at 9");
        assert_eq!(envelope.data["sent_at"], "2024-04-01T09:00:00Z");
    }

    #[tokio::test]
    async fn test_send_message_to_offline_recipient_is_not_delivered() {
        // テスト項目: 未接続の宛先へのメッセージは delivered = false になる
        // given (前提条件):
        let usecase = create_usecase(Arc::new(WebSocketMessagePusher::new()));
        let alice = UserId::new("alice").unwrap();

        // when (操作):
        let result = usecase.execute(&alice, payload("bob", "hello")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(false));
    }

    #[tokio::test]
    async fn test_send_message_rejects_invalid_input() {
        // テスト項目: 空のメッセージや空の宛先はエラーになる
        // given (前提条件):
        let usecase = create_usecase(Arc::new(WebSocketMessagePusher::new()));
        let alice = UserId::new("alice").unwrap();

        // when (操作):
        let empty = usecase.execute(&alice, payload("bob", "   ")).await;
        let no_recipient = usecase.execute(&alice, payload("", "hello")).await;

        // then (期待する結果):
        assert_eq!(empty, Err(SendMessageError::EmptyContent));
        assert_eq!(
            no_recipient,
            Err(SendMessageError::InvalidRecipient(ValueObjectError::EmptyUserId))
        );
    }
}
