//! Timer state controller
//!
//! Owns the one [`TimerState`] of a session and applies the start, pause,
//! discard and commit transitions to it. Every transition is written through
//! to the [`StateStore`]; write failures are logged and otherwise ignored, so
//! the in-memory state stays authoritative for the rest of the session.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    time_entry::TimeEntry,
    timer_state::{TimerPhase, TimerSnapshot, TimerState, MIN_COMMIT_MS},
};
use crate::{
    error::TimerError,
    services::{sink::CommitSink, store::StateStore},
    utils::clock::Clock,
};

pub struct TimerController {
    state: TimerState,
    clock: Arc<dyn Clock>,
    store: Arc<dyn StateStore>,
}

impl TimerController {
    /// Rehydrate the timer from `store`, or start fresh if nothing usable is stored.
    ///
    /// A timer left running keeps accruing: its elapsed time is recomputed
    /// from the stored start time and the current clock.
    pub fn load(clock: Arc<dyn Clock>, store: Arc<dyn StateStore>) -> Self {
        let state = match store.load() {
            Ok(Some(record)) => {
                let mut state = TimerState::from_record(record);
                state.sampled_elapsed_ms = state.elapsed_at(clock.now_ms());
                info!(
                    "Restored timer: running={}, elapsed={}ms",
                    state.is_running(),
                    state.sampled_elapsed_ms
                );
                state
            }
            Ok(None) => {
                debug!("No stored timer, starting idle");
                TimerState::new()
            }
            Err(e) => {
                warn!("Failed to load stored timer, starting idle: {}", e);
                TimerState::new()
            }
        };

        Self { state, clock, store }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Elapsed time right now
    pub fn elapsed_ms(&self) -> i64 {
        self.state.elapsed_at(self.clock.now_ms())
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::capture(&self.state, self.clock.now_ms())
    }

    /// Start or resume accruing. Returns false if already running.
    pub fn start(&mut self) -> bool {
        let TimerPhase::Stopped { elapsed_ms } = self.state.phase else {
            debug!("Timer already running, ignoring start");
            return false;
        };

        self.state.phase = TimerPhase::Running {
            started_at_ms: self.clock.now_ms(),
            prior_elapsed_ms: elapsed_ms,
        };
        self.state.sampled_elapsed_ms = elapsed_ms;
        info!("Timer started with {}ms already accrued", elapsed_ms);
        self.persist();
        true
    }

    /// Stop accruing and freeze the elapsed time. Returns false if already stopped.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running() {
            debug!("Timer not running, ignoring pause");
            return false;
        }

        let elapsed_ms = self.elapsed_ms();
        self.state.phase = TimerPhase::Stopped { elapsed_ms };
        self.state.sampled_elapsed_ms = elapsed_ms;
        info!("Timer paused at {}ms", elapsed_ms);
        self.persist();
        true
    }

    /// Sampler tick: refresh the stored elapsed time while running.
    ///
    /// Returns `None` once the timer is stopped, which tells the sampler to quit.
    pub fn sample(&mut self) -> Option<i64> {
        if !self.state.is_running() {
            return None;
        }

        let elapsed_ms = self.elapsed_ms();
        self.state.sampled_elapsed_ms = elapsed_ms;
        self.persist();
        Some(elapsed_ms)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.state.description = description.into();
        self.persist();
    }

    /// Throw the session away. Needs explicit confirmation.
    pub fn discard(&mut self, confirmed: bool) -> Result<(), TimerError> {
        if !confirmed {
            return Err(TimerError::ConfirmationRequired);
        }

        info!("Discarding timer with {}ms accrued", self.elapsed_ms());
        self.reset();
        Ok(())
    }

    /// Validate the session and turn it into a time entry.
    ///
    /// Pauses a running timer first. On a validation error nothing else changes.
    pub fn prepare_commit(&mut self) -> Result<TimeEntry, TimerError> {
        if self.state.description.trim().is_empty() {
            return Err(TimerError::DescriptionRequired);
        }

        self.pause();

        let elapsed_ms = self.elapsed_ms();
        if elapsed_ms < MIN_COMMIT_MS {
            return Err(TimerError::BelowMinimum { elapsed_ms });
        }

        Ok(TimeEntry::from_session(
            &self.state.description,
            elapsed_ms,
            self.clock.today(),
        ))
    }

    /// Commit the session to `sink`, resetting only once the sink accepts it
    pub async fn commit(&mut self, sink: &dyn CommitSink) -> Result<TimeEntry, TimerError> {
        let entry = self.prepare_commit()?;

        if let Err(e) = sink.commit(&entry).await {
            warn!("Commit failed, keeping timer at {}ms: {}", self.elapsed_ms(), e);
            return Err(e.into());
        }

        info!("Committed {:.2}h for {:?}", entry.hours, entry.description);
        self.reset();
        Ok(entry)
    }

    /// Best-effort write of the current state, used at shutdown
    pub fn flush(&mut self) {
        if self.state.is_running() {
            self.state.sampled_elapsed_ms = self.elapsed_ms();
        }
        self.persist();
    }

    fn reset(&mut self) {
        self.state = TimerState::new();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored timer: {}", e);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state.to_record()) {
            warn!("Failed to persist timer state: {}", e);
        }
    }
}

impl std::fmt::Debug for TimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
