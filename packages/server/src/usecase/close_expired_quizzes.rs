//! UseCase: 期限切れ Quiz の自動クローズ
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CloseExpiredQuizzesUseCase::execute() メソッド
//! - 期限切れ Quiz の受験中 Attempt の自動提出と Quiz のクローズ
//!
//! ### なぜこのテストが必要か
//! - 締め切り後も受験中のまま残る Attempt を確実に終わらせる
//! - 2 回目以降のスイープで書き込みが発生しない（冪等性）ことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：期限切れ Quiz と受験中 Attempt
//! - 冪等性：連続したスイープ
//! - 異常系：Repository エラー

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{AttemptStatus, AttemptUpdate, QuizId, QuizRepository};

use super::error::SweepError;

/// 1 回のスイープの結果
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    /// 期限切れとして検出された Quiz
    pub expired_quizzes: Vec<QuizId>,
    /// 自動提出された Attempt の件数
    pub auto_submitted_attempts: usize,
    /// クローズされた Quiz の件数
    pub closed_quizzes: usize,
}

impl SweepReport {
    fn empty(swept_at: DateTime<Utc>) -> Self {
        Self {
            swept_at,
            expired_quizzes: Vec::new(),
            auto_submitted_attempts: 0,
            closed_quizzes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expired_quizzes.is_empty()
    }
}

/// 期限切れ Quiz を自動クローズするユースケース
pub struct CloseExpiredQuizzesUseCase {
    repository: Arc<dyn QuizRepository>,
}

impl CloseExpiredQuizzesUseCase {
    pub fn new(repository: Arc<dyn QuizRepository>) -> Self {
        Self { repository }
    }

    /// スイープを 1 回実行
    ///
    /// 1. `close_date <= now` の開いている Quiz を検索
    /// 2. 各 Quiz の受験中 Attempt を `auto_submitted` にし、`end_time = submission_time = now`
    /// 3. 検出した Quiz を `closed` / `is_active = false` に一括更新
    ///
    /// Attempt を先に更新するため、3 が失敗しても次回のスイープで同じ Quiz が再検出される。
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let expired = self.repository.find_expired_active(now).await?;
        let mut report = SweepReport::empty(now);
        if expired.is_empty() {
            return Ok(report);
        }

        let update = AttemptUpdate::auto_submitted(now);
        for quiz in &expired {
            let modified = self
                .repository
                .bulk_update_attempts(&quiz.id, AttemptStatus::InProgress, update)
                .await?;
            tracing::debug!(
                "Auto-submitted {} attempt(s) of quiz '{}' ({})",
                modified,
                quiz.title,
                quiz.id
            );
            report.auto_submitted_attempts += modified;
        }

        report.expired_quizzes = expired.iter().map(|quiz| quiz.id).collect();
        report.closed_quizzes = self
            .repository
            .bulk_close_quizzes(&report.expired_quizzes)
            .await?;

        Ok(report)
    }
}
