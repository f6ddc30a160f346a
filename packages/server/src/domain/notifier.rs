//! 締め切りリマインダー通知のインターフェース

use async_trait::async_trait;

use super::ReminderError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadlineNotifier: Send + Sync {
    /// リマインダーを一回送信し、送信件数を返す
    async fn send_deadline_reminders(&self) -> Result<usize, ReminderError>;
}
