//! Reconnection policy
//!
//! 再接続は最大 `max_attempts` 回まで行い、n 回目の待ち時間は `base_delay * n` です
//! （倍々ではなく線形に伸びます）。

use std::time::Duration;

/// Retry budget and delay schedule of the reconnection controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// What the controller decided after an unexpected closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Auto-reconnect is off or there is no session
    Skip,
    /// A reconnect timer was scheduled
    Scheduled,
    /// The budget is exhausted
    GiveUp,
}

impl ReconnectPolicy {
    /// Delay before attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Next attempt number, or `None` once `attempts_so_far` reached the budget
    pub fn next_attempt(&self, attempts_so_far: u32) -> Option<u32> {
        if attempts_so_far >= self.max_attempts {
            None
        } else {
            Some(attempts_so_far + 1)
        }
    }
}
