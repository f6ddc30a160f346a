//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ユーザー ID と WebSocket の `UnboundedSender` の対応を管理
//! - 通知を `new_message` フレームにエンコードしてユーザーへ送信（push_to）
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は `register` イベントで渡された sender を受け取り、通知に使用します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{MessagePushError, MessagePusher, Notification, PusherChannel, UserId},
    infrastructure::dto::websocket::NotificationDto,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 登録済みユーザーの WebSocket sender
    clients: Mutex<HashMap<UserId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, user_id: UserId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        if clients.insert(user_id.clone(), sender).is_some() {
            tracing::debug!("User '{}' re-registered, replacing previous socket", user_id);
        } else {
            tracing::debug!("User '{}' registered to MessagePusher", user_id);
        }
    }

    async fn unregister_client(&self, user_id: &UserId, sender: &PusherChannel) {
        let mut clients = self.clients.lock().await;
        if clients
            .get(user_id)
            .is_some_and(|current| current.same_channel(sender))
        {
            clients.remove(user_id);
            tracing::debug!("User '{}' unregistered from MessagePusher", user_id);
        }
    }

    async fn push_to(
        &self,
        user_id: &UserId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let frame = NotificationDto::from(notification)
            .to_frame()
            .map_err(|e| MessagePushError::Encode(e.to_string()))?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(user_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(user_id.to_string()))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to user '{}'", user_id);
        Ok(())
    }

    async fn is_online(&self, user_id: &UserId) -> bool {
        let clients = self.clients.lock().await;
        clients.get(user_id).is_some_and(|sender| !sender.is_closed())
    }
}
