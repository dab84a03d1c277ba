//! bt-tracker - A persistent work timer
//!
//! This library provides a wall-clock work timer that survives restarts,
//! persists itself to a local key-value store and commits finished sessions
//! as billable time entries to a hosted backend.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{SinkError, StoreError, TimerError};
pub use state::{AppState, TimerController};
pub use utils::signals::shutdown_signal;
