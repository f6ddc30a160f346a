//! リアルタイム通知
//!
//! ユーザーへ push する通知の内容。ワイヤー形式へのエンコードはインフラ層が行います。

use chrono::{DateTime, Utc};

use super::{QuizId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// 他のユーザーから中継されたメッセージ
    Direct {
        from: UserId,
        content: String,
        sent_at: DateTime<Utc>,
    },
    /// 受験中の Quiz の締め切りが近い
    DeadlineReminder {
        quiz_id: QuizId,
        title: String,
        close_date: DateTime<Utc>,
    },
}
