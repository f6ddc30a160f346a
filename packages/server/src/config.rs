//! Server configuration.
//!
//! Every setting can be given on the command line or through a `TERAKOYA_*`
//! environment variable.

use std::{path::PathBuf, time::Duration};

use chrono::NaiveTime;
use clap::Parser;
use thiserror::Error;

use crate::scheduler::SchedulerConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "terakoya-server")]
#[command(about = "Terakoya e-learning server with realtime notifications and quiz deadline scheduler", long_about = None)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TERAKOYA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TERAKOYA_PORT", default_value = "8080")]
    pub port: u16,

    /// Seconds between expiry sweeps
    #[arg(long, env = "TERAKOYA_SWEEP_INTERVAL_SECS", default_value = "300")]
    pub sweep_interval_secs: u64,

    /// Local time of the daily deadline reminder pass (HH:MM)
    #[arg(long, env = "TERAKOYA_REMINDER_TIME", default_value = "09:00")]
    pub reminder_time: String,

    /// Quizzes closing within this many hours get a reminder
    #[arg(long, env = "TERAKOYA_REMINDER_WINDOW_HOURS", default_value = "24")]
    pub reminder_window_hours: i64,

    /// JSON fixture with quizzes and attempts to load at startup
    #[arg(long, env = "TERAKOYA_SEED")]
    pub seed: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("Invalid reminder time '{0}', expected HH:MM")]
    InvalidReminderTime(String),

    #[error("Reminder window must be a positive number of hours (got {0})")]
    InvalidReminderWindow(i64),
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub scheduler: SchedulerConfig,
    pub reminder_window: chrono::Duration,
    pub seed: Option<PathBuf>,
}

impl TryFrom<Args> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        let reminder_time = NaiveTime::parse_from_str(&args.reminder_time, "%H:%M")
            .map_err(|_| ConfigError::InvalidReminderTime(args.reminder_time.clone()))?;
        if args.reminder_window_hours <= 0 {
            return Err(ConfigError::InvalidReminderWindow(args.reminder_window_hours));
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            scheduler: SchedulerConfig {
                sweep_interval: Duration::from_secs(args.sweep_interval_secs),
                reminder_time,
            },
            reminder_window: chrono::Duration::hours(args.reminder_window_hours),
            seed: args.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["terakoya-server"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしで既定値の設定になる
        // given (前提条件):
        let args = parse(&[]);

        // when (操作):
        let config = ServerConfig::try_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 8080);
        assert_eq!(config.scheduler.sweep_interval, Duration::from_secs(300));
        assert_eq!(
            config.scheduler.reminder_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(config.reminder_window, chrono::Duration::hours(24));
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        // テスト項目: 不正な設定値は ConfigError になる
        // given (前提条件):
        let zero_interval = parse(&["--sweep-interval-secs", "0"]);
        let bad_time = parse(&["--reminder-time", "25:00"]);
        let bad_window = parse(&["--reminder-window-hours", "0"]);

        // when (操作):

        // then (期待する結果):
        assert_eq!(
            ServerConfig::try_from(zero_interval).unwrap_err(),
            ConfigError::ZeroSweepInterval
        );
        assert_eq!(
            ServerConfig::try_from(bad_time).unwrap_err(),
            ConfigError::InvalidReminderTime("25:00".to_string())
        );
        assert_eq!(
            ServerConfig::try_from(bad_window).unwrap_err(),
            ConfigError::InvalidReminderWindow(0)
        );
    }
}
