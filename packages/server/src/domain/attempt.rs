//! Attempt エンティティ（受験記録）

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{QuizId, UserId, ValueObjectError};

/// Attempt ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidId(value.to_string()))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Attempt の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    AutoSubmitted,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::AutoSubmitted => "auto_submitted",
        }
    }

    /// 提出済み（終端状態）か
    pub fn is_finished(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

impl FromStr for AttemptStatus {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "submitted" => Ok(AttemptStatus::Submitted),
            "auto_submitted" => Ok(AttemptStatus::AutoSubmitted),
            other => Err(ValueObjectError::UnknownStatus(other.to_string())),
        }
    }
}

/// 一括更新で書き込むフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptUpdate {
    pub status: AttemptStatus,
    pub end_time: DateTime<Utc>,
    pub submission_time: DateTime<Utc>,
}

impl AttemptUpdate {
    /// 締め切りによる自動提出
    pub fn auto_submitted(now: DateTime<Utc>) -> Self {
        Self {
            status: AttemptStatus::AutoSubmitted,
            end_time: now,
            submission_time: now,
        }
    }
}

/// Attempt エンティティ
///
/// ## 不変条件
///
/// - 提出済み（`submitted` / `auto_submitted`）なら `end_time` と `submission_time` が設定されており、以後変更されない
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub status: AttemptStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
}

impl Attempt {
    /// 受験を開始
    pub fn start(quiz_id: QuizId, user_id: UserId, start_time: DateTime<Utc>) -> Self {
        Self {
            id: AttemptId::generate(),
            quiz_id,
            user_id,
            status: AttemptStatus::InProgress,
            start_time,
            end_time: None,
            submission_time: None,
        }
    }

    /// 受験者自身による提出
    pub fn submit(&mut self, now: DateTime<Utc>) -> bool {
        self.apply(AttemptUpdate {
            status: AttemptStatus::Submitted,
            end_time: now,
            submission_time: now,
        })
    }

    /// 更新を適用する。提出済みの Attempt は変更せず false を返す
    pub fn apply(&mut self, update: AttemptUpdate) -> bool {
        if self.status.is_finished() {
            return false;
        }
        self.status = update.status;
        self.end_time = Some(update.end_time);
        self.submission_time = Some(update.submission_time);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn test_apply_auto_submit_stamps_both_times() {
        // テスト項目: 自動提出で status と end_time / submission_time が設定される
        // given (前提条件):
        let mut attempt = Attempt::start(QuizId::generate(), alice(), now() - Duration::minutes(30));

        // when (操作):
        let changed = attempt.apply(AttemptUpdate::auto_submitted(now()));

        // then (期待する結果):
        assert!(changed);
        assert_eq!(attempt.status, AttemptStatus::AutoSubmitted);
        assert_eq!(attempt.end_time, Some(now()));
        assert_eq!(attempt.submission_time, Some(now()));
    }

    #[test]
    fn test_finished_attempt_is_immutable() {
        // テスト項目: 提出済みの Attempt は自動提出で上書きされない
        // given (前提条件):
        let mut attempt = Attempt::start(QuizId::generate(), alice(), now() - Duration::minutes(30));
        let submitted_at = now() - Duration::minutes(5);
        attempt.submit(submitted_at);

        // when (操作):
        let changed = attempt.apply(AttemptUpdate::auto_submitted(now()));

        // then (期待する結果):
        assert!(!changed);
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        assert_eq!(attempt.end_time, Some(submitted_at));
        assert_eq!(attempt.submission_time, Some(submitted_at));
    }

    #[test]
    fn test_attempt_status_round_trips_through_str() {
        // テスト項目: AttemptStatus と文字列表現が相互に変換できる
        // given (前提条件):
        let statuses = [
            AttemptStatus::InProgress,
            AttemptStatus::Submitted,
            AttemptStatus::AutoSubmitted,
        ];

        // when (操作):

        // then (期待する結果):
        for status in statuses {
            assert_eq!(status.as_str().parse::<AttemptStatus>(), Ok(status));
        }
    }
}
