//! UseCase 層
//!
//! ドメインモデルと Repository / MessagePusher を組み合わせたアプリケーションの処理。

mod close_expired_quizzes;
mod error;
mod get_quiz_detail;
mod register_user;
mod send_deadline_reminders;
mod send_message;

pub use close_expired_quizzes::{CloseExpiredQuizzesUseCase, SweepReport};
pub use error::{GetQuizDetailError, SendMessageError, SweepError};
pub use get_quiz_detail::GetQuizDetailUseCase;
pub use register_user::RegisterUserUseCase;
pub use send_deadline_reminders::SendDeadlineRemindersUseCase;
pub use send_message::SendMessageUseCase;
