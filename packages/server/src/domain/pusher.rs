//! MessagePusher trait 定義
//!
//! 接続中のユーザーへのリアルタイム通知のインターフェース。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, Notification, UserId};

/// ユーザーのソケットへ送るテキストフレームのチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// ユーザーとソケットのチャンネルを紐付ける（既存の紐付けは置き換える）
    async fn register_client(&self, user_id: UserId, sender: PusherChannel);

    /// `sender` が現在の紐付けと同じ場合のみ解除する
    ///
    /// 再接続した新しいソケットの紐付けを、古いソケットの切断処理が消さないようにする。
    async fn unregister_client(&self, user_id: &UserId, sender: &PusherChannel);

    /// 特定のユーザーに通知を送信
    async fn push_to(
        &self,
        user_id: &UserId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// ユーザーが接続中か
    async fn is_online(&self, user_id: &UserId) -> bool;
}
