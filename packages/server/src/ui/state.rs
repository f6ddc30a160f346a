//! Server state shared with the handlers.

use std::sync::Arc;

use crate::usecase::{GetQuizDetailUseCase, RegisterUserUseCase, SendMessageUseCase};

/// Shared application state
pub struct AppState {
    /// RegisterUserUseCase（リアルタイムチャンネルの紐付け）
    pub register_user_usecase: Arc<RegisterUserUseCase>,
    /// SendMessageUseCase（ユーザー間メッセージの中継）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetQuizDetailUseCase（Quiz 詳細の取得）
    pub get_quiz_detail_usecase: Arc<GetQuizDetailUseCase>,
}
