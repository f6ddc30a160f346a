//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Attempt, AttemptStatus, AttemptUpdate, Quiz, QuizId, RepositoryError};

/// Quiz / Attempt Repository trait
///
/// ## 一括更新の条件付き適用
///
/// `bulk_update_attempts` と `bulk_close_quizzes` は「読み出してから書き込む」のではなく、
/// 現在の状態（`status` / `is_active`）を条件にしたフィルタ付き更新として実装すること。
/// 受験者による提出と同時に実行されても更新が失われない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// `close_date <= now` かつ `status ∈ {active, draft}` かつ `is_active` の Quiz を取得
    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Quiz>, RepositoryError>;

    /// 指定 Quiz の `from_status` の Attempt を一括更新し、更新件数を返す
    async fn bulk_update_attempts(
        &self,
        quiz_id: &QuizId,
        from_status: AttemptStatus,
        update: AttemptUpdate,
    ) -> Result<usize, RepositoryError>;

    /// まだ開いている Quiz を一括でクローズし、更新件数を返す
    async fn bulk_close_quizzes(&self, quiz_ids: &[QuizId]) -> Result<usize, RepositoryError>;

    /// 開いている Quiz のうち `from < close_date <= to` のものを取得
    async fn find_closing_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Quiz>, RepositoryError>;

    async fn insert_quiz(&self, quiz: Quiz) -> Result<(), RepositoryError>;

    async fn insert_attempt(&self, attempt: Attempt) -> Result<(), RepositoryError>;

    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, RepositoryError>;

    async fn attempts_for_quiz(&self, quiz_id: &QuizId) -> Result<Vec<Attempt>, RepositoryError>;
}
