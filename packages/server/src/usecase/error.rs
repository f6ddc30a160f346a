//! UseCase errors.

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// 期限切れ Quiz の自動クローズ（スイープ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("Expiry sweep failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(#[from] ValueObjectError),

    #[error("Message content must not be empty")]
    EmptyContent,

    #[error("Message content is too long ({0} characters)")]
    ContentTooLong(usize),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Quiz 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetQuizDetailError {
    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
