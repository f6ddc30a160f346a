//! UseCase: リアルタイムチャンネルとユーザーの紐付け

use std::sync::Arc;

use crate::domain::{MessagePusher, PusherChannel, UserId};

/// `register` イベントでソケットをユーザーに紐付けるユースケース
pub struct RegisterUserUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RegisterUserUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// ソケットをユーザーに紐付ける
    pub async fn register(&self, user_id: UserId, sender: PusherChannel) {
        self.message_pusher.register_client(user_id.clone(), sender).await;
        tracing::info!("User '{}' registered realtime channel", user_id);
    }

    /// ソケットの切断時に紐付けを解除する
    pub async fn unregister(&self, user_id: &UserId, sender: &PusherChannel) {
        self.message_pusher.unregister_client(user_id, sender).await;
        tracing::info!("User '{}' realtime channel closed", user_id);
    }
}
