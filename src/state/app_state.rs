//! Main application state management

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use super::{TimeEntry, TimerController, TimerSnapshot};
use crate::{error::TimerError, services::CommitSink};

/// Shared state behind the HTTP API and the sampler task
pub struct AppState {
    /// The one timer of this process. Held across the sink call during a commit.
    pub controller: Mutex<TimerController>,
    pub sink: Arc<dyn CommitSink>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: StdMutex<Option<String>>,
    pub last_action_time: StdMutex<Option<DateTime<Utc>>>,
    /// Timer snapshots after each user-initiated change
    pub state_change_tx: broadcast::Sender<TimerSnapshot>,
}

impl AppState {
    pub fn new(controller: TimerController, sink: Arc<dyn CommitSink>, port: u16, host: String) -> Self {
        let (state_change_tx, _) = broadcast::channel(100);

        Self {
            controller: Mutex::new(controller),
            sink,
            start_time: Instant::now(),
            port,
            host,
            last_action: StdMutex::new(None),
            last_action_time: StdMutex::new(None),
            state_change_tx,
        }
    }

    /// Current snapshot of the timer
    pub async fn snapshot(&self) -> TimerSnapshot {
        self.controller.lock().await.snapshot()
    }

    pub async fn is_running(&self) -> bool {
        self.controller.lock().await.is_running()
    }

    pub async fn start(&self) -> TimerSnapshot {
        self.apply("start", |controller| {
            controller.start();
        })
        .await
    }

    pub async fn pause(&self) -> TimerSnapshot {
        self.apply("pause", |controller| {
            controller.pause();
        })
        .await
    }

    pub async fn set_description(&self, description: String) -> TimerSnapshot {
        self.apply("describe", move |controller| controller.set_description(description))
            .await
    }

    pub async fn discard(&self, confirmed: bool) -> Result<TimerSnapshot, TimerError> {
        let mut controller = self.controller.lock().await;
        controller.discard(confirmed)?;
        let snapshot = controller.snapshot();
        drop(controller);

        self.record_action("discard");
        self.notify(snapshot.clone());
        Ok(snapshot)
    }

    /// Commit the session. The timer is notified even on failure, since a
    /// running timer gets paused before the sink is called.
    pub async fn commit(&self) -> Result<(TimeEntry, TimerSnapshot), TimerError> {
        let mut controller = self.controller.lock().await;
        let was_running = controller.is_running();
        let result = controller.commit(self.sink.as_ref()).await;
        let snapshot = controller.snapshot();
        drop(controller);

        match result {
            Ok(entry) => {
                self.record_action("commit");
                self.notify(snapshot.clone());
                Ok((entry, snapshot))
            }
            Err(e) => {
                if was_running && !snapshot.is_running {
                    self.notify(snapshot);
                }
                Err(e)
            }
        }
    }

    /// Sampler tick. Returns `None` once the timer has stopped.
    pub async fn sample(&self) -> Option<i64> {
        self.controller.lock().await.sample()
    }

    /// Best-effort persist at shutdown
    pub async fn flush(&self) {
        self.controller.lock().await.flush();
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    async fn apply<F>(&self, action: &str, updater: F) -> TimerSnapshot
    where
        F: FnOnce(&mut TimerController),
    {
        let mut controller = self.controller.lock().await;
        updater(&mut *controller);
        let snapshot = controller.snapshot();
        drop(controller); // Release the lock early

        self.record_action(action);
        self.notify(snapshot.clone());
        snapshot
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    fn notify(&self, snapshot: TimerSnapshot) {
        // No receivers just means the sampler is not up yet
        if let Err(e) = self.state_change_tx.send(snapshot) {
            debug!("No listeners for timer change: {}", e);
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("port", &self.port)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{MemoryStore, RecordingSink, StateStore},
        utils::clock::ManualClock,
    };
    use assert_matches::assert_matches;

    fn app(clock: &ManualClock, store: Arc<MemoryStore>, sink: Arc<RecordingSink>) -> AppState {
        let controller = TimerController::load(Arc::new(clock.clone()), store);
        AppState::new(controller, sink, 0, "127.0.0.1".to_string())
    }

    #[tokio::test]
    async fn transitions_are_broadcast() {
        let clock = ManualClock::at(0);
        let state = app(&clock, Arc::new(MemoryStore::new()), Arc::new(RecordingSink::new()));
        let mut rx = state.state_change_tx.subscribe();

        state.start().await;
        assert!(rx.recv().await.unwrap().is_running);

        clock.advance(3_000);
        state.pause().await;
        let snapshot = rx.recv().await.unwrap();
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.elapsed_ms, 3_000);
        assert_eq!(state.get_last_action().0.as_deref(), Some("pause"));
    }

    #[tokio::test]
    async fn failed_commit_broadcasts_implicit_pause() {
        let clock = ManualClock::at(0);
        let sink = Arc::new(RecordingSink::new());
        sink.set_failing(true);
        let state = app(&clock, Arc::new(MemoryStore::new()), sink);

        state.set_description("Rigging plot".to_string()).await;
        state.start().await;
        clock.advance(61_000);

        let mut rx = state.state_change_tx.subscribe();
        assert_matches!(state.commit().await, Err(TimerError::Sink(_)));
        assert!(!rx.recv().await.unwrap().is_running);

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.elapsed_ms, 61_000);
        assert_eq!(snapshot.description, "Rigging plot");
    }

    #[tokio::test]
    async fn flush_persists_running_timer() {
        let clock = ManualClock::at(0);
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, store.clone(), Arc::new(RecordingSink::new()));

        state.start().await;
        clock.advance(8_000);
        state.flush().await;

        let record = store.load().unwrap().unwrap();
        assert!(record.is_running);
        assert_eq!(record.elapsed, 8_000);
    }
}
