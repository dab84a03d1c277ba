//! Timer state structure and its persisted form

use serde::{Deserialize, Serialize};

/// Minimum tracked time before a session can be committed
pub const MIN_COMMIT_MS: i64 = 60_000;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Whether the clock is accruing time.
///
/// Running carries its own start timestamp, so a running timer without a
/// start time cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Not accruing. `elapsed_ms` is authoritative.
    Stopped { elapsed_ms: i64 },
    /// Accruing since `started_at_ms`, on top of `prior_elapsed_ms` from earlier segments.
    Running {
        started_at_ms: i64,
        prior_elapsed_ms: i64,
    },
}

/// In-memory timer state owned by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub phase: TimerPhase,
    /// Free-text label for the work being timed
    pub description: String,
    /// Elapsed time as of the last sampler tick or transition
    pub sampled_elapsed_ms: i64,
}

impl TimerState {
    /// Create a stopped timer with nothing accrued
    pub fn new() -> Self {
        Self {
            phase: TimerPhase::Stopped { elapsed_ms: 0 },
            description: String::new(),
            sampled_elapsed_ms: 0,
        }
    }

    /// Check if the timer is running
    pub fn is_running(&self) -> bool {
        matches!(self.phase, TimerPhase::Running { .. })
    }

    /// Elapsed time at wall-clock instant `now_ms`.
    ///
    /// Never smaller than the last sampled value, so a clock stepping
    /// backwards cannot shrink the accrued time.
    pub fn elapsed_at(&self, now_ms: i64) -> i64 {
        match self.phase {
            TimerPhase::Stopped { elapsed_ms } => elapsed_ms,
            TimerPhase::Running {
                started_at_ms,
                prior_elapsed_ms,
            } => {
                let segment = now_ms.saturating_sub(started_at_ms).max(0);
                prior_elapsed_ms
                    .saturating_add(segment)
                    .max(self.sampled_elapsed_ms)
            }
        }
    }

    /// Timestamp from which `now - start` yields the total elapsed time
    pub fn effective_start_ms(&self) -> Option<i64> {
        match self.phase {
            TimerPhase::Stopped { .. } => None,
            TimerPhase::Running {
                started_at_ms,
                prior_elapsed_ms,
            } => Some(started_at_ms.saturating_sub(prior_elapsed_ms)),
        }
    }

    /// Convert into the record written to local storage
    pub fn to_record(&self) -> PersistedTimer {
        let elapsed = match self.phase {
            TimerPhase::Stopped { elapsed_ms } => elapsed_ms,
            TimerPhase::Running { .. } => self.sampled_elapsed_ms,
        };

        PersistedTimer {
            is_running: self.is_running(),
            start_time: self.effective_start_ms(),
            elapsed,
            description: self.description.clone(),
        }
    }

    /// Rebuild the state from a stored record.
    ///
    /// A record claiming to run without a start time comes back stopped.
    pub fn from_record(record: PersistedTimer) -> Self {
        let elapsed = record.elapsed.max(0);
        let phase = match (record.is_running, record.start_time) {
            (true, Some(start_time)) => TimerPhase::Running {
                started_at_ms: start_time,
                prior_elapsed_ms: 0,
            },
            (true, None) => {
                tracing::warn!("Stored timer claims to be running without a start time, loading it stopped");
                TimerPhase::Stopped { elapsed_ms: elapsed }
            }
            (false, _) => TimerPhase::Stopped { elapsed_ms: elapsed },
        };

        Self {
            phase,
            description: record.description,
            sampled_elapsed_ms: elapsed,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON record stored under the `bt_tracker_state` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedTimer {
    pub is_running: bool,
    /// Effective start: `now - elapsed` at the moment the timer was started
    pub start_time: Option<i64>,
    pub elapsed: i64,
    pub description: String,
}

impl Default for PersistedTimer {
    fn default() -> Self {
        TimerState::new().to_record()
    }
}

/// Read-only view of the timer at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub elapsed_ms: i64,
    /// `M:SS` under an hour, `H:MM:SS` otherwise
    pub display: String,
    pub description: String,
    pub has_accrued_time: bool,
    /// Whether a commit would pass local validation
    pub can_commit: bool,
}

impl TimerSnapshot {
    /// Build a snapshot of `state` at `now_ms`
    pub fn capture(state: &TimerState, now_ms: i64) -> Self {
        let elapsed_ms = state.elapsed_at(now_ms);
        Self {
            is_running: state.is_running(),
            elapsed_ms,
            display: format_elapsed(elapsed_ms),
            description: state.description.clone(),
            has_accrued_time: elapsed_ms > 0,
            can_commit: elapsed_ms >= MIN_COMMIT_MS && !state.description.trim().is_empty(),
        }
    }
}

/// Format milliseconds as `M:SS` or `H:MM:SS`
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Convert milliseconds to hours rounded to two decimal places
pub fn hours_from_elapsed(elapsed_ms: i64) -> f64 {
    let hours = elapsed_ms.max(0) as f64 / MS_PER_HOUR;
    (hours * 100.0).round() / 100.0
}
