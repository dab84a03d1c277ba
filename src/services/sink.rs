//! Commit sink: appends finished sessions to the remote time entries collection

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{error::SinkError, state::TimeEntry};

/// Destination for committed time entries
#[async_trait]
pub trait CommitSink: Send + Sync {
    /// Append one entry. Success means the remote store accepted it.
    async fn commit(&self, entry: &TimeEntry) -> Result<(), SinkError>;
}

/// Settings for the HTTP sink
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Collection endpoint rows are POSTed to
    pub url: Url,
    /// Backend API key, sent as `apikey` and as a bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts per commit, including the first
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base: Duration,
}

impl SinkConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_key: None,
            timeout: Duration::from_secs(10),
            attempts: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Sink posting rows to a hosted REST collection
#[derive(Debug, Clone)]
pub struct HttpSink {
    config: SinkConfig,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::config(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    async fn send_once(&self, entry: &TimeEntry) -> Result<(), SinkError> {
        let mut request = self
            .client
            .post(self.config.url.clone())
            .header("Prefer", "return=minimal")
            .json(entry);

        if let Some(key) = &self.config.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> SinkError {
        if e.is_timeout() {
            SinkError::Timeout {
                timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            SinkError::transport(e.to_string())
        }
    }
}

#[async_trait]
impl CommitSink for HttpSink {
    async fn commit(&self, entry: &TimeEntry) -> Result<(), SinkError> {
        let attempts = self.config.attempts.max(1);
        let mut delay = self.config.backoff_base;
        let mut attempt = 1;

        loop {
            debug!("Posting time entry to {} (attempt {}/{})", self.config.url, attempt, attempts);
            match self.send_once(entry).await {
                Ok(()) => {
                    info!("Time entry saved: {:.2}h on {}", entry.hours, entry.date);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!("Failed to save time entry: {}, retrying in {:?}", e, delay);
                    sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Giving up on time entry after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Sink keeping entries in memory
///
/// Used when no backend is configured, and by tests. It can be switched into a
/// failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<TimeEntry>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent commit with a 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Entries accepted so far
    pub fn entries(&self) -> Vec<TimeEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommitSink for RecordingSink {
    async fn commit(&self, entry: &TimeEntry) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                body: "recording sink set to fail".to_string(),
            });
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SinkError::transport(format!("Failed to lock recorded entries: {}", e)))?;
        info!(
            "Recorded time entry locally: {:?} {:.2}h on {}",
            entry.description, entry.hours, entry.date
        );
        entries.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn entry() -> TimeEntry {
        TimeEntry::from_session(
            "Lighting design",
            185_000,
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
        )
    }

    #[tokio::test]
    async fn recording_sink_keeps_entries() {
        let sink = RecordingSink::new();
        sink.commit(&entry()).await.unwrap();
        assert_eq!(sink.entries(), vec![entry()]);
    }

    #[tokio::test]
    async fn failing_recording_sink_keeps_nothing() {
        let sink = RecordingSink::new();
        sink.set_failing(true);
        assert_matches!(sink.commit(&entry()).await, Err(SinkError::Status { status: 503, .. }));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn default_config_matches_documented_limits() {
        let config = SinkConfig::new(Url::parse("http://localhost/rest/v1/time_entries").unwrap());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.attempts, 3);
        assert!(config.api_key.is_none());
    }
}
