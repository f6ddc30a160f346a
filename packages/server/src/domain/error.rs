//! Domain errors.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("User ID must not be empty")]
    EmptyUserId,

    #[error("User ID is too long ({0} characters, max 64)")]
    UserIdTooLong(usize),

    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    #[error("Unknown status '{0}'")]
    UnknownStatus(String),
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Quiz '{0}' not found")]
    QuizNotFound(String),

    #[error("Quiz '{0}' already exists")]
    DuplicateQuiz(String),

    #[error("Attempt '{0}' already exists")]
    DuplicateAttempt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("User '{0}' is not connected")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode notification: {0}")]
    Encode(String),
}

/// Deadline reminder pass errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("Reminder lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}
