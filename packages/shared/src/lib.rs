//! Shared utilities for the Terakoya server and client.

pub mod logger;
pub mod protocol;
pub mod time;
