//! Terakoya e-learning server.
//!
//! Realtime push hub over WebSocket plus the deadline scheduler that
//! auto-closes expired quizzes and sends daily deadline reminders.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod bootstrap;
pub mod config;
pub mod scheduler;
