//! State management module
//!
//! This module contains the timer state model, the controller that owns it
//! and the shared application state served over HTTP.

pub mod app_state;
pub mod time_entry;
pub mod timer_controller;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use time_entry::TimeEntry;
pub use timer_controller::TimerController;
pub use timer_state::{TimerPhase, TimerSnapshot, TimerState};
