//! Time-related utilities with clock abstraction for testability.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

/// Format an instant as RFC 3339 in the local time zone
pub fn to_local_rfc3339(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&chrono::Local).to_rfc3339()
}

/// Compute the delay until the next wall-clock occurrence of `at`.
///
/// If `now` is already at or past `at` today, the next occurrence is tomorrow.
/// Local times that fall into a DST gap are resolved as if they were UTC.
pub fn next_daily_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let tz = now.timezone();
    let today = now.date_naive();
    let date = if now.time() >= at {
        today.succ_opt().unwrap_or(today)
    } else {
        today
    };

    let naive = date.and_time(at);
    let target = tz
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive));

    target
        .signed_duration_since(now)
        .to_std()
        .unwrap_or_default()
}
