//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod sampler;

// Re-export main functions
pub use sampler::{sampler_task, SAMPLE_INTERVAL};
