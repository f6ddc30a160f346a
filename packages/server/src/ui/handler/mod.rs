//! Request handlers.

mod http;
mod websocket;

pub use http::{get_quiz_detail, health_check};
pub use websocket::websocket_handler;
