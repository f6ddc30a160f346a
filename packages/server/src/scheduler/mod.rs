//! Deadline Scheduler
//!
//! プロセス全体で 1 つだけ起動するバックグラウンドジョブ。2 つの独立したタイマーを持ちます。
//!
//! 1. 期限切れスイープ：一定間隔（既定 5 分）で期限切れ Quiz を自動クローズ
//! 2. 日次リマインダー：毎日決まった時刻（既定 9:00 ローカル時刻）に締め切りリマインダーを送信
//!
//! スケジューラ自身は状態を持たず、読み書きする状態はすべて Repository にあります。
//! 複数プロセスで同時に起動した場合の排他制御は行いません。

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{Local, NaiveTime};
use terakoya_shared::time::{Clock, next_daily_run};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval, interval_at},
};

use crate::{
    domain::DeadlineNotifier,
    usecase::{CloseExpiredQuizzesUseCase, SweepError, SweepReport},
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the Deadline Scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between expiry sweeps (default: 5 minutes)
    pub sweep_interval: Duration,
    /// Local wall-clock time of the daily reminder pass (default: 09:00)
    pub reminder_time: NaiveTime,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
            reminder_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Jobs shared between the scheduler handle and its timer tasks
struct Jobs {
    close_expired_quizzes: Arc<CloseExpiredQuizzesUseCase>,
    notifier: Arc<dyn DeadlineNotifier>,
    clock: Arc<dyn Clock>,
}

impl Jobs {
    async fn sweep(&self) -> Result<SweepReport, SweepError> {
        let now = self.clock.now();
        let result = self.close_expired_quizzes.execute(now).await;
        match &result {
            Ok(report) if report.is_empty() => {
                tracing::debug!("Expiry sweep at {}: nothing to close", now);
            }
            Ok(report) => {
                tracing::info!(
                    "Expiry sweep at {}: closed {} quiz(zes), auto-submitted {} attempt(s)",
                    now,
                    report.closed_quizzes,
                    report.auto_submitted_attempts
                );
            }
            Err(e) => {
                tracing::error!("Expiry sweep at {} failed: {}", now, e);
            }
        }
        result
    }

    async fn remind(&self) {
        match self.notifier.send_deadline_reminders().await {
            Ok(count) => tracing::info!("Deadline reminder pass sent {} reminder(s)", count),
            Err(e) => tracing::error!("Deadline reminder pass failed: {}", e),
        }
    }
}

/// Deadline Scheduler
///
/// `start()` で 2 つのタイマーを起動し、`stop()` で停止します。
pub struct DeadlineScheduler {
    jobs: Arc<Jobs>,
    config: SchedulerConfig,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DeadlineScheduler {
    pub fn new(
        close_expired_quizzes: Arc<CloseExpiredQuizzesUseCase>,
        notifier: Arc<dyn DeadlineNotifier>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            jobs: Arc::new(Jobs {
                close_expired_quizzes,
                notifier,
                clock,
            }),
            config,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Start both timers. Calling `start` on a running scheduler is a no-op.
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if !handles.is_empty() {
            tracing::debug!("DeadlineScheduler already running");
            return;
        }

        let first_reminder = self.first_reminder_delay();
        tracing::info!(
            "DeadlineScheduler started: sweep every {:?}, first reminder pass in {:?} (daily at {})",
            self.config.sweep_interval,
            first_reminder,
            self.config.reminder_time
        );

        handles.push(tokio::spawn(sweep_loop(
            self.jobs.clone(),
            self.config.sweep_interval,
        )));
        handles.push(tokio::spawn(reminder_loop(self.jobs.clone(), first_reminder)));
    }

    /// Abort both timers
    pub fn stop(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.is_empty() {
            return;
        }
        for handle in handles.drain(..) {
            handle.abort();
        }
        tracing::info!("DeadlineScheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        !handles.is_empty()
    }

    /// Run one expiry sweep now
    pub async fn sweep_once(&self) -> Result<SweepReport, SweepError> {
        self.jobs.sweep().await
    }

    /// Run one reminder pass now
    pub async fn remind_once(&self) {
        self.jobs.remind().await
    }

    /// Delay from now until the first reminder pass (computed in local time)
    pub fn first_reminder_delay(&self) -> Duration {
        let now = self.jobs.clock.now().with_timezone(&Local);
        next_daily_run(&now, self.config.reminder_time)
    }
}

impl Drop for DeadlineScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep_loop(jobs: Arc<Jobs>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        // errors are logged inside; the next tick still runs
        let _ = jobs.sweep().await;
    }
}

async fn reminder_loop(jobs: Arc<Jobs>, first_delay: Duration) {
    // fixed 24h period after the first run, no wall-clock correction
    let mut ticker = interval_at(Instant::now() + first_delay, DAY);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        jobs.remind().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use terakoya_shared::time::FixedClock;

    use super::*;
    use crate::domain::{MockDeadlineNotifier, MockQuizRepository, ReminderError, RepositoryError};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - スイープが一定間隔で実行され、失敗しても次の周期が実行されること
    // - 日次リマインダーが初回時刻に 1 回、その後 24 時間ごとに 1 回実行されること
    // - リマインダーが失敗しても翌日のリマインダーが実行されること
    // - stop() 後はどちらのタイマーも実行されないこと
    //
    // tokio の仮想時間（start_paused）で時間を進めて検証する。
    // ========================================

    #[derive(Default)]
    struct CountingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DeadlineNotifier for CountingNotifier {
        async fn send_deadline_reminders(&self) -> Result<usize, ReminderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap()
    }

    fn counting_repository(calls: Arc<AtomicUsize>, fail: bool) -> MockQuizRepository {
        let mut repository = MockQuizRepository::new();
        repository.expect_find_expired_active().returning(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(RepositoryError::Unavailable("database down".to_string()))
            } else {
                Ok(vec![])
            }
        });
        repository
    }

    fn create_scheduler(
        repository: MockQuizRepository,
        notifier: Arc<dyn DeadlineNotifier>,
    ) -> DeadlineScheduler {
        DeadlineScheduler::new(
            Arc::new(CloseExpiredQuizzesUseCase::new(Arc::new(repository))),
            notifier,
            Arc::new(FixedClock::new(now())),
            SchedulerConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_every_interval() {
        // テスト項目: スイープが起動直後と 5 分ごとに実行される
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = create_scheduler(
            counting_repository(calls.clone(), false),
            Arc::new(CountingNotifier::default()),
        );

        // when (操作):
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;

        // then (期待する結果): 0 分, 5 分, 10 分
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_failure_does_not_stop_timer() {
        // テスト項目: スイープが失敗しても次の周期のスイープが実行される
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = create_scheduler(
            counting_repository(calls.clone(), true),
            Arc::new(CountingNotifier::default()),
        );

        // when (操作):
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(15 * 60 + 1)).await;

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_runs_once_per_day_after_first_run() {
        // テスト項目: 初回時刻に 1 回、その後 24 時間ごとに 1 回だけリマインダーが実行される
        // given (前提条件):
        let notifier = Arc::new(CountingNotifier::default());
        let scheduler = create_scheduler(
            counting_repository(Arc::new(AtomicUsize::new(0)), false),
            notifier.clone(),
        );
        let first = scheduler.first_reminder_delay();
        let second = Duration::from_secs(1);

        // when (操作):
        scheduler.start();
        tokio::time::sleep(first.saturating_sub(second)).await;
        let before_first = notifier.calls.load(Ordering::SeqCst);
        tokio::time::sleep(second * 2).await;
        let after_first = notifier.calls.load(Ordering::SeqCst);
        tokio::time::sleep(DAY - second * 2).await;
        let before_second = notifier.calls.load(Ordering::SeqCst);
        tokio::time::sleep(second * 2).await;
        let after_second = notifier.calls.load(Ordering::SeqCst);

        // then (期待する結果):
        assert_eq!(before_first, 0);
        assert_eq!(after_first, 1);
        assert_eq!(before_second, 1);
        assert_eq!(after_second, 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_failure_does_not_stop_daily_timer() {
        // テスト項目: リマインダーの送信に失敗しても 24 時間後のリマインダーは実行される
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let mut notifier = MockDeadlineNotifier::new();
        let counter = calls.clone();
        notifier.expect_send_deadline_reminders().returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ReminderError::Repository(RepositoryError::Unavailable(
                    "database down".to_string(),
                )))
            } else {
                Ok(3)
            }
        });
        let scheduler = create_scheduler(
            counting_repository(Arc::new(AtomicUsize::new(0)), false),
            Arc::new(notifier),
        );
        let first = scheduler.first_reminder_delay();

        // when (操作):
        scheduler.start();
        tokio::time::sleep(first + Duration::from_secs(1)).await;
        let after_failure = calls.load(Ordering::SeqCst);
        tokio::time::sleep(DAY).await;

        // then (期待する結果):
        assert_eq!(after_failure, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timers_and_start_is_idempotent() {
        // テスト項目: start の二重呼び出しでタイマーが増えず、stop 後は実行されない
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = create_scheduler(
            counting_repository(calls.clone(), false),
            Arc::new(CountingNotifier::default()),
        );

        // when (操作):
        scheduler.start();
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let after_start = calls.load(Ordering::SeqCst);
        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(60 * 60)).await;

        // then (期待する結果):
        assert_eq!(after_start, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_sweep_once_reports_error() {
        // テスト項目: sweep_once が Repository のエラーを返す
        // given (前提条件):
        let scheduler = create_scheduler(
            counting_repository(Arc::new(AtomicUsize::new(0)), true),
            Arc::new(CountingNotifier::default()),
        );

        // when (操作):
        let result = scheduler.sweep_once().await;

        // then (期待する結果):
        assert!(matches!(result, Err(SweepError::Repository(_))));
    }
}
