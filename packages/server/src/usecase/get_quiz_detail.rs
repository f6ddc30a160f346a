//! UseCase: Quiz 詳細の取得

use std::sync::Arc;

use crate::domain::{Attempt, Quiz, QuizId, QuizRepository, RepositoryError};

use super::error::GetQuizDetailError;

/// Quiz 詳細取得のユースケース
pub struct GetQuizDetailUseCase {
    repository: Arc<dyn QuizRepository>,
}

impl GetQuizDetailUseCase {
    pub fn new(repository: Arc<dyn QuizRepository>) -> Self {
        Self { repository }
    }

    /// Quiz とその Attempt 一覧を取得
    pub async fn execute(&self, quiz_id: &str) -> Result<(Quiz, Vec<Attempt>), GetQuizDetailError> {
        let quiz_id = QuizId::parse(quiz_id).map_err(|_| GetQuizDetailError::QuizNotFound)?;
        let quiz = match self.repository.get_quiz(&quiz_id).await {
            Ok(quiz) => quiz,
            Err(RepositoryError::QuizNotFound(_)) => return Err(GetQuizDetailError::QuizNotFound),
            Err(e) => return Err(GetQuizDetailError::Repository(e)),
        };
        let attempts = self.repository.attempts_for_quiz(&quiz_id).await?;
        Ok((quiz, attempts))
    }
}
