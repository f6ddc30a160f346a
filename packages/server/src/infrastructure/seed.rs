//! Seed fixture loading.

use std::path::Path;

use thiserror::Error;

use crate::domain::{Attempt, Quiz, QuizRepository, RepositoryError, ValueObjectError};

use super::dto::seed::SeedFixture;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid seed record: {0}")]
    Invalid(#[from] ValueObjectError),

    #[error("Failed to store seed record: {0}")]
    Repository(#[from] RepositoryError),
}

/// Load a JSON fixture file into the repository.
///
/// Returns the number of quizzes and attempts inserted.
pub async fn load_seed_file(
    path: &Path,
    repository: &dyn QuizRepository,
) -> Result<(usize, usize), SeedError> {
    let text = tokio::fs::read_to_string(path).await?;
    let fixture: SeedFixture = serde_json::from_str(&text)?;
    load_fixture(fixture, repository).await
}

pub async fn load_fixture(
    fixture: SeedFixture,
    repository: &dyn QuizRepository,
) -> Result<(usize, usize), SeedError> {
    let quiz_count = fixture.quizzes.len();
    let attempt_count = fixture.attempts.len();

    for record in fixture.quizzes {
        repository.insert_quiz(Quiz::try_from(record)?).await?;
    }
    for record in fixture.attempts {
        repository.insert_attempt(Attempt::try_from(record)?).await?;
    }

    Ok((quiz_count, attempt_count))
}
