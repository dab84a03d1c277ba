//! Clock sampler background task

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::broadcast::error::RecvError,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// How often a running timer is re-sampled and persisted
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that refreshes the elapsed time of a running timer.
///
/// Idles until a state change reports the timer running, then samples once
/// per [`SAMPLE_INTERVAL`] until a change reports it stopped. Returns when the
/// state change channel closes.
pub async fn sampler_task(state: Arc<AppState>) {
    info!("Starting clock sampler task");

    let mut state_rx = state.state_change_tx.subscribe();
    // A timer restored from storage may already be running
    let mut running = state.is_running().await;

    loop {
        if !running {
            match state_rx.recv().await {
                Ok(snapshot) => running = snapshot.is_running,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Sampler missed {} timer changes, re-reading state", skipped);
                    running = state.is_running().await;
                }
                Err(RecvError::Closed) => break,
            }
            continue;
        }

        debug!("Timer running, sampling every {:?}", SAMPLE_INTERVAL);
        let mut interval = interval_at(Instant::now() + SAMPLE_INTERVAL, SAMPLE_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.sample().await {
                        Some(elapsed_ms) => debug!("Sampled elapsed time: {}ms", elapsed_ms),
                        None => {
                            running = false;
                            break;
                        }
                    }
                }

                message = state_rx.recv() => match message {
                    Ok(snapshot) if !snapshot.is_running => {
                        debug!("Timer stopped, cancelling sampler");
                        running = false;
                        break;
                    }
                    Ok(_) => {}
                    // A missed stop is caught by the next tick
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Sampler missed {} timer changes while running", skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("State change channel closed, stopping clock sampler");
                        return;
                    }
                }
            }
        }
    }

    info!("State change channel closed, stopping clock sampler");
}
