//! Wall-clock abstraction
//!
//! The timer measures elapsed time from wall-clock timestamps rather than a
//! monotonic clock, so that time keeps accruing while the process is not
//! running. Everything that reads the time goes through [`Clock`] so tests can
//! drive it by hand.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// Today's date in the user's local time zone
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
    today: NaiveDate,
}

impl ManualClock {
    /// Create a clock frozen at `now_ms`, reporting `today` as the local date
    pub fn new(now_ms: i64, today: NaiveDate) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(now_ms)),
            today,
        }
    }

    /// Create a clock at `now_ms` whose date is derived from the UTC timestamp
    pub fn at(now_ms: i64) -> Self {
        let today = DateTime::<Utc>::from_timestamp_millis(now_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_default();
        Self::new(now_ms, today)
    }

    /// Move the clock forward (or backward, for negative values)
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
