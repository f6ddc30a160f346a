//! Domain 層
//!
//! クイズと受験（Attempt）のモデル、およびドメイン層が必要とする
//! インターフェース（Repository, MessagePusher, DeadlineNotifier）と通知の内容を定義します。

mod attempt;
mod error;
mod notification;
mod notifier;
mod pusher;
mod quiz;
mod repository;
mod value_object;

pub use attempt::{Attempt, AttemptId, AttemptStatus, AttemptUpdate};
pub use error::{MessagePushError, ReminderError, RepositoryError, ValueObjectError};
pub use notification::Notification;
pub use notifier::DeadlineNotifier;
pub use pusher::{MessagePusher, PusherChannel};
pub use quiz::{Quiz, QuizId, QuizStatus};
pub use repository::QuizRepository;
pub use value_object::UserId;

#[cfg(test)]
pub use notifier::MockDeadlineNotifier;
#[cfg(test)]
pub use repository::MockQuizRepository;
