//! Utility functions module
//!
//! Wall-clock access and shutdown signal handling shared across the application.

pub mod clock;
pub mod signals;

// Re-export main items
pub use clock::{Clock, ManualClock, SystemClock};
pub use signals::shutdown_signal;
