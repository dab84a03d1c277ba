//! Time entry rows appended to the remote collection

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timer_state::hours_from_elapsed;

/// One committed work session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub description: String,
    /// Elapsed time in hours, rounded to two decimals
    pub hours: f64,
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub billable: bool,
}

impl TimeEntry {
    /// Build a billable entry from a finished session
    pub fn from_session(description: &str, elapsed_ms: i64, date: NaiveDate) -> Self {
        Self {
            description: description.trim().to_string(),
            hours: hours_from_elapsed(elapsed_ms),
            date,
            billable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_row() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        let entry = TimeEntry::from_session(" Lighting design ", 185_000, date);

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({
                "description": "Lighting design",
                "hours": 0.05,
                "date": "2024-05-17",
                "billable": true,
            })
        );
    }
}
