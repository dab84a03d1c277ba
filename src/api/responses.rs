//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{TimeEntry, TimerSnapshot};

/// API response structure for timer actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    /// The entry handed to the backend, present after a successful commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<TimeEntry>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
            entry: None,
        }
    }

    /// Create a response whose status reflects whether the timer runs
    pub fn for_timer(message: String, timer: TimerSnapshot) -> Self {
        let status = if timer.is_running { "running" } else { "stopped" };
        Self::new(status, message, timer)
    }

    /// Create a response for a committed session
    pub fn committed(entry: TimeEntry, timer: TimerSnapshot) -> Self {
        let message = format!("Saved {:.2}h for \"{}\"", entry.hours, entry.description);
        Self {
            entry: Some(entry),
            ..Self::new("committed", message, timer)
        }
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerSnapshot) -> Self {
        Self::new("error", message, timer)
    }
}

/// Status response with server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Body of `PUT /timer/description`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

/// Body of `POST /timer/discard`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscardRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
