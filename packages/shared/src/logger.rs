//! Logging setup utilities for the Terakoya binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for both the package crate and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `crate_name` - The package name of the caller (e.g., `env!("CARGO_PKG_NAME")`)
/// * `binary_name` - The name of the binary (e.g., "terakoya-server")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use terakoya_shared::logger::setup_logger;
///
/// setup_logger(env!("CARGO_PKG_NAME"), "terakoya-server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Cargo package and binary names use `-` while tracing targets use `_`.
fn default_filter(crate_name: &str, binary_name: &str, level: &str) -> String {
    format!(
        "{}={level},{}={level},terakoya_shared={level}",
        crate_name.replace('-', "_"),
        binary_name.replace('-', "_"),
    )
}
