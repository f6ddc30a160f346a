//! Terakoya e-learning server.
//!
//! Serves the realtime channel and the HTTP API, and runs the deadline
//! scheduler (expiry sweep every 5 minutes, reminder pass daily at 09:00).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin terakoya-server
//! cargo run --bin terakoya-server -- --port 3000 --seed fixtures/quizzes.json
//! ```

use std::sync::Arc;

use clap::Parser;
use terakoya_server::{
    bootstrap::build_application,
    config::{Args, ServerConfig},
};
use terakoya_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = match build_application(&config, Arc::new(SystemClock)).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    app.scheduler.start();
    let result = app.server.run(config.host, config.port).await;
    app.scheduler.stop();

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
