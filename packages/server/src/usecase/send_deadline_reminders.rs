//! UseCase: 締め切りリマインダー通知
//!
//! 締め切りが近い（リマインダー期間内の）公開中 Quiz について、
//! まだ受験中の Attempt を持つ接続中ユーザーに `new_message` を送ります。

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use chrono::Duration;
use terakoya_shared::time::Clock;

use crate::domain::{
    AttemptStatus, DeadlineNotifier, MessagePusher, Notification, QuizRepository, ReminderError,
    UserId,
};

/// 締め切りリマインダーのユースケース
pub struct SendDeadlineRemindersUseCase {
    repository: Arc<dyn QuizRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// 現在時刻からこの期間内に締め切られる Quiz が対象
    window: Duration,
}

impl SendDeadlineRemindersUseCase {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            window,
        }
    }
}

#[async_trait]
impl DeadlineNotifier for SendDeadlineRemindersUseCase {
    async fn send_deadline_reminders(&self) -> Result<usize, ReminderError> {
        let now = self.clock.now();
        let quizzes = self
            .repository
            .find_closing_between(now, now + self.window)
            .await?;

        let mut delivered = 0;
        for quiz in quizzes {
            let recipients: BTreeSet<UserId> = self
                .repository
                .attempts_for_quiz(&quiz.id)
                .await?
                .into_iter()
                .filter(|attempt| attempt.status == AttemptStatus::InProgress)
                .map(|attempt| attempt.user_id)
                .collect();
            if recipients.is_empty() {
                continue;
            }

            let notification = Notification::DeadlineReminder {
                quiz_id: quiz.id,
                title: quiz.title.clone(),
                close_date: quiz.close_date,
            };

            for user_id in recipients {
                if !self.message_pusher.is_online(&user_id).await {
                    tracing::debug!("User '{}' is offline, skipping reminder", user_id);
                    continue;
                }
                match self.message_pusher.push_to(&user_id, &notification).await {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::warn!("Failed to remind user '{}': {}", user_id, e),
                }
            }
        }

        Ok(delivered)
    }
}
