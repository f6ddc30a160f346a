//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: realtime `new_message` payloads
//! - `http`: HTTP API response DTOs
//! - `seed`: JSON fixture loaded into the store at boot

pub mod http;
pub mod seed;
pub mod websocket;
