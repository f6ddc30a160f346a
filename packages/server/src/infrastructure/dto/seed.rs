//! Seed fixture DTOs.
//!
//! ```json
//! {
//!   "quizzes": [{"id": "…uuid…", "title": "Algebra", "close_date": "2024-04-01T09:00:00Z",
//!                "status": "active", "is_active": true}],
//!   "attempts": [{"quiz_id": "…uuid…", "user_id": "alice", "status": "in_progress",
//!                 "start_time": "2024-04-01T08:30:00Z"}]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{Attempt, AttemptId, AttemptStatus, Quiz, QuizId, UserId, ValueObjectError};

#[derive(Debug, Default, Deserialize)]
pub struct SeedFixture {
    #[serde(default)]
    pub quizzes: Vec<QuizRecord>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Debug, Deserialize)]
pub struct QuizRecord {
    pub id: String,
    pub title: String,
    pub close_date: DateTime<Utc>,
    #[serde(default = "default_quiz_status")]
    pub status: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AttemptRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub quiz_id: String,
    pub user_id: String,
    #[serde(default = "default_attempt_status")]
    pub status: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submission_time: Option<DateTime<Utc>>,
}

fn default_quiz_status() -> String {
    "active".to_string()
}

fn default_attempt_status() -> String {
    "in_progress".to_string()
}

fn default_true() -> bool {
    true
}

impl TryFrom<QuizRecord> for Quiz {
    type Error = ValueObjectError;

    fn try_from(record: QuizRecord) -> Result<Self, Self::Error> {
        let id = QuizId::parse(&record.id)?;
        let status = record.status.parse()?;
        Ok(Quiz::new(id, record.title, record.close_date).with_status(status, record.is_active))
    }
}

impl TryFrom<AttemptRecord> for Attempt {
    type Error = ValueObjectError;

    fn try_from(record: AttemptRecord) -> Result<Self, Self::Error> {
        let id = match record.id {
            Some(id) => AttemptId::parse(&id)?,
            None => AttemptId::generate(),
        };
        let status: AttemptStatus = record.status.parse()?;
        // 提出済みの記録は end_time / submission_time を必ず持つ
        let (end_time, submission_time) = if status.is_finished() {
            let end = record.end_time.or(record.submission_time).unwrap_or(record.start_time);
            (Some(end), Some(record.submission_time.unwrap_or(end)))
        } else {
            (None, None)
        };
        Ok(Attempt {
            id,
            quiz_id: QuizId::parse(&record.quiz_id)?,
            user_id: UserId::new(record.user_id)?,
            status,
            start_time: record.start_time,
            end_time,
            submission_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuizStatus;

    #[test]
    fn test_fixture_defaults() {
        // テスト項目: status / is_active を省略した記録は公開中・受験中として読み込まれる
        // given (前提条件):
        let text = r#"{
            "quizzes": [{"id": "7f1c2a3e-1b7f-4c5e-9d0a-2f9b8e6d5c4b", "title": "Algebra",
                         "close_date": "2024-04-01T09:00:00Z"}],
            "attempts": [{"quiz_id": "7f1c2a3e-1b7f-4c5e-9d0a-2f9b8e6d5c4b", "user_id": "alice",
                          "start_time": "2024-04-01T08:30:00Z"}]
        }"#;

        // when (操作):
        let fixture: SeedFixture = serde_json::from_str(text).unwrap();
        let quiz = Quiz::try_from(fixture.quizzes.into_iter().next().unwrap()).unwrap();
        let attempt = Attempt::try_from(fixture.attempts.into_iter().next().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(quiz.status, QuizStatus::Active);
        assert!(quiz.is_active);
        assert_eq!(attempt.status, AttemptStatus::InProgress);
        assert_eq!(attempt.quiz_id, quiz.id);
        assert_eq!(attempt.end_time, None);
    }

    #[test]
    fn test_finished_record_gets_timestamps() {
        // テスト項目: 提出済みの記録には end_time / submission_time が補完される
        // given (前提条件):
        let text = r#"{"quiz_id": "7f1c2a3e-1b7f-4c5e-9d0a-2f9b8e6d5c4b", "user_id": "bob",
                       "status": "submitted", "start_time": "2024-04-01T08:30:00Z",
                       "submission_time": "2024-04-01T08:50:00Z"}"#;

        // when (操作):
        let record: AttemptRecord = serde_json::from_str(text).unwrap();
        let attempt = Attempt::try_from(record).unwrap();

        // then (期待する結果):
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        assert_eq!(attempt.end_time, attempt.submission_time);
        assert!(attempt.end_time.is_some());
    }

    #[test]
    fn test_invalid_quiz_id_is_rejected() {
        // テスト項目: UUID でない Quiz ID はエラーになる
        // given (前提条件):
        let record = QuizRecord {
            id: "not-a-uuid".to_string(),
            title: "x".to_string(),
            close_date: Utc::now(),
            status: "active".to_string(),
            is_active: true,
        };

        // when (操作):
        let result = Quiz::try_from(record);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::InvalidId("not-a-uuid".to_string()))
        );
    }
}
