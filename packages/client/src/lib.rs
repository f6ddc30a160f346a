//! Terakoya realtime client.
//!
//! [`socket::SocketService`] is the reusable part: one auto-reconnecting
//! connection with event fan-out. [`run_client`] wraps it into an interactive CLI.

mod command;
pub mod error;
mod formatter;
mod runner;
pub mod socket;
mod ui;

pub use runner::run_client;
