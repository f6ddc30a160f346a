//! InMemory Quiz Repository 実装
//!
//! ドメイン層が定義する QuizRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 一括更新は 1 回のロック取得の中でフィルタ条件を評価してから書き込むため、
//! 同時に行われる提出処理と交互に実行されることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    Attempt, AttemptStatus, AttemptUpdate, Quiz, QuizId, QuizRepository, RepositoryError,
};

#[derive(Default)]
struct Store {
    quizzes: HashMap<QuizId, Quiz>,
    /// 挿入順を保つため Vec で保持
    attempts: Vec<Attempt>,
}

/// インメモリ Quiz Repository 実装
#[derive(Default)]
pub struct InMemoryQuizRepository {
    store: Mutex<Store>,
}

impl InMemoryQuizRepository {
    /// 空の InMemoryQuizRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Quiz>, RepositoryError> {
        let store = self.store.lock().await;
        let mut quizzes: Vec<Quiz> = store
            .quizzes
            .values()
            .filter(|quiz| quiz.is_expired_open(now))
            .cloned()
            .collect();
        quizzes.sort_by_key(|quiz| quiz.close_date);
        Ok(quizzes)
    }

    async fn bulk_update_attempts(
        &self,
        quiz_id: &QuizId,
        from_status: AttemptStatus,
        update: AttemptUpdate,
    ) -> Result<usize, RepositoryError> {
        let mut store = self.store.lock().await;
        let modified = store
            .attempts
            .iter_mut()
            .filter(|attempt| attempt.quiz_id == *quiz_id && attempt.status == from_status)
            .map(|attempt| attempt.apply(update))
            .filter(|changed| *changed)
            .count();
        Ok(modified)
    }

    async fn bulk_close_quizzes(&self, quiz_ids: &[QuizId]) -> Result<usize, RepositoryError> {
        let mut store = self.store.lock().await;
        let mut modified = 0;
        for quiz_id in quiz_ids {
            if let Some(quiz) = store.quizzes.get_mut(quiz_id)
                && quiz.is_open()
            {
                quiz.close();
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn find_closing_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Quiz>, RepositoryError> {
        let store = self.store.lock().await;
        let mut quizzes: Vec<Quiz> = store
            .quizzes
            .values()
            .filter(|quiz| quiz.is_open() && quiz.close_date > from && quiz.close_date <= to)
            .cloned()
            .collect();
        quizzes.sort_by_key(|quiz| quiz.close_date);
        Ok(quizzes)
    }

    async fn insert_quiz(&self, quiz: Quiz) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        if store.quizzes.contains_key(&quiz.id) {
            return Err(RepositoryError::DuplicateQuiz(quiz.id.to_string()));
        }
        store.quizzes.insert(quiz.id, quiz);
        Ok(())
    }

    async fn insert_attempt(&self, attempt: Attempt) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        if !store.quizzes.contains_key(&attempt.quiz_id) {
            return Err(RepositoryError::QuizNotFound(attempt.quiz_id.to_string()));
        }
        if store.attempts.iter().any(|a| a.id == attempt.id) {
            return Err(RepositoryError::DuplicateAttempt(attempt.id.to_string()));
        }
        store.attempts.push(attempt);
        Ok(())
    }

    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, RepositoryError> {
        let store = self.store.lock().await;
        store
            .quizzes
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| RepositoryError::QuizNotFound(quiz_id.to_string()))
    }

    async fn attempts_for_quiz(&self, quiz_id: &QuizId) -> Result<Vec<Attempt>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .attempts
            .iter()
            .filter(|attempt| attempt.quiz_id == *quiz_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::{QuizStatus, UserId};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryQuizRepository のフィルタ付き一括更新
    // - 期限切れ Quiz の検索条件
    //
    // 【なぜこのテストが必要か】
    // - 締め切りスケジューラは Repository の条件付き更新に依存して冪等性を保つ
    // - 提出済みの Attempt やクローズ済みの Quiz を上書きしないことを保証する
    // ========================================

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_find_expired_active_filters_by_date_and_state() {
        // テスト項目: 締め切り済みかつ開いている Quiz だけが返される
        // given (前提条件):
        let repository = InMemoryQuizRepository::new();
        let expired = Quiz::new(QuizId::generate(), "expired", now() - Duration::hours(1));
        let draft = Quiz::new(QuizId::generate(), "draft", now() - Duration::hours(2))
            .with_status(QuizStatus::Draft, true);
        let future = Quiz::new(QuizId::generate(), "future", now() + Duration::hours(1));
        let closed = Quiz::new(QuizId::generate(), "closed", now() - Duration::hours(1))
            .with_status(QuizStatus::Closed, false);
        for quiz in [expired.clone(), draft.clone(), future, closed] {
            repository.insert_quiz(quiz).await.unwrap();
        }

        // when (操作):
        let result = repository.find_expired_active(now()).await.unwrap();

        // then (期待する結果):
        let ids: Vec<QuizId> = result.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![draft.id, expired.id]);
    }

    #[tokio::test]
    async fn test_bulk_update_attempts_only_touches_matching_status() {
        // テスト項目: 対象 Quiz の in_progress の Attempt だけが更新される
        // given (前提条件):
        let repository = InMemoryQuizRepository::new();
        let quiz = Quiz::new(QuizId::generate(), "quiz", now());
        let other = Quiz::new(QuizId::generate(), "other", now());
        repository.insert_quiz(quiz.clone()).await.unwrap();
        repository.insert_quiz(other.clone()).await.unwrap();

        let started = now() - Duration::minutes(30);
        let mut submitted = Attempt::start(quiz.id, user("bob"), started);
        submitted.submit(now() - Duration::minutes(1));
        repository.insert_attempt(Attempt::start(quiz.id, user("alice"), started)).await.unwrap();
        repository.insert_attempt(submitted).await.unwrap();
        repository.insert_attempt(Attempt::start(other.id, user("carol"), started)).await.unwrap();

        // when (操作):
        let modified = repository
            .bulk_update_attempts(&quiz.id, AttemptStatus::InProgress, AttemptUpdate::auto_submitted(now()))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(modified, 1);
        let attempts = repository.attempts_for_quiz(&quiz.id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::AutoSubmitted);
        assert_eq!(attempts[1].status, AttemptStatus::Submitted);
        let untouched = repository.attempts_for_quiz(&other.id).await.unwrap();
        assert_eq!(untouched[0].status, AttemptStatus::InProgress);
    }

    #[tokio::test]
    async fn test_bulk_close_quizzes_skips_already_closed() {
        // テスト項目: クローズ済みの Quiz は更新件数に含まれない
        // given (前提条件):
        let repository = InMemoryQuizRepository::new();
        let open = Quiz::new(QuizId::generate(), "open", now());
        let closed = Quiz::new(QuizId::generate(), "closed", now())
            .with_status(QuizStatus::Closed, false);
        repository.insert_quiz(open.clone()).await.unwrap();
        repository.insert_quiz(closed.clone()).await.unwrap();

        // when (操作):
        let modified = repository
            .bulk_close_quizzes(&[open.id, closed.id, QuizId::generate()])
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(modified, 1);
        let reloaded = repository.get_quiz(&open.id).await.unwrap();
        assert_eq!(reloaded.status, QuizStatus::Closed);
        assert!(!reloaded.is_active);
    }

    #[tokio::test]
    async fn test_insert_attempt_requires_existing_quiz() {
        // テスト項目: 存在しない Quiz への Attempt はエラーになる
        // given (前提条件):
        let repository = InMemoryQuizRepository::new();
        let quiz_id = QuizId::generate();

        // when (操作):
        let result = repository
            .insert_attempt(Attempt::start(quiz_id, user("alice"), now()))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::QuizNotFound(quiz_id.to_string())));
    }

    #[tokio::test]
    async fn test_find_closing_between_is_half_open() {
        // テスト項目: from < close_date <= to の開いている Quiz が返される
        // given (前提条件):
        let repository = InMemoryQuizRepository::new();
        let at_from = Quiz::new(QuizId::generate(), "at_from", now());
        let inside = Quiz::new(QuizId::generate(), "inside", now() + Duration::hours(3));
        let at_to = Quiz::new(QuizId::generate(), "at_to", now() + Duration::hours(24));
        let after = Quiz::new(QuizId::generate(), "after", now() + Duration::hours(25));
        for quiz in [at_from, inside.clone(), at_to.clone(), after] {
            repository.insert_quiz(quiz).await.unwrap();
        }

        // when (操作):
        let result = repository
            .find_closing_between(now(), now() + Duration::hours(24))
            .await
            .unwrap();

        // then (期待する結果):
        let ids: Vec<QuizId> = result.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![inside.id, at_to.id]);
    }
}
