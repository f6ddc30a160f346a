//! Interactive Terakoya client.
//!
//! Connects to the realtime endpoint as one user, prints connection state
//! changes and incoming messages, and sends direct messages typed as
//! `@user message`. Reconnects automatically after an unexpected disconnect
//! (max 5 attempts, waiting 2s × attempt).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin terakoya-client -- --user-id alice
//! cargo run --bin terakoya-client -- -u ws://127.0.0.1:8080/ws -i bob --no-auto-reconnect
//! ```

use clap::Parser;
use terakoya_client::socket::DEFAULT_URL;
use terakoya_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "terakoya-client")]
#[command(about = "Realtime client for the Terakoya learning platform", long_about = None)]
struct Args {
    /// User ID sent with the handshake
    #[arg(short = 'i', long, env = "TERAKOYA_USER_ID")]
    user_id: String,

    /// WebSocket endpoint URL
    #[arg(short = 'u', long, env = "TERAKOYA_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Do not reconnect after an unexpected disconnect
    #[arg(long)]
    no_auto_reconnect: bool,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) =
        terakoya_client::run_client(args.url, args.user_id, !args.no_auto_reconnect).await
    {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
