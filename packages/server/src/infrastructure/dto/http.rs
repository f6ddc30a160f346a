//! HTTP API response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Attempt, Quiz};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDto {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDetailDto {
    pub id: String,
    pub title: String,
    pub close_date: DateTime<Utc>,
    pub status: String,
    pub is_active: bool,
    pub attempts: Vec<AttemptDto>,
}

impl From<Attempt> for AttemptDto {
    fn from(model: Attempt) -> Self {
        Self {
            id: model.id.to_string(),
            user_id: model.user_id.into_string(),
            status: model.status.as_str().to_string(),
            start_time: model.start_time,
            end_time: model.end_time,
            submission_time: model.submission_time,
        }
    }
}

impl QuizDetailDto {
    pub fn new(quiz: Quiz, attempts: Vec<Attempt>) -> Self {
        Self {
            id: quiz.id.to_string(),
            title: quiz.title,
            close_date: quiz.close_date,
            status: quiz.status.as_str().to_string(),
            is_active: quiz.is_active,
            attempts: attempts.into_iter().map(AttemptDto::from).collect(),
        }
    }
}
