//! External service module
//!
//! This module contains the adapters the timer talks to: the local
//! key-value store and the remote time entries collection.

pub mod sink;
pub mod store;

// Re-export main types
pub use sink::{CommitSink, HttpSink, RecordingSink, SinkConfig};
pub use store::{FileStore, MemoryStore, StateStore, STATE_KEY};
