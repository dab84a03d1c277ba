//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use reqwest::Url;

use crate::services::SinkConfig;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "bt-tracker")]
#[command(about = "A persistent work timer that commits billable time entries")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Key-value file the timer state is kept in
    #[arg(long, env = "BT_STATE_FILE", default_value = "bt_tracker.json")]
    pub state_file: PathBuf,

    /// Time entries collection URL; entries stay in memory when unset
    #[arg(long, env = "BT_SINK_URL")]
    pub sink_url: Option<Url>,

    /// API key for the time entries backend
    #[arg(long, env = "BT_SINK_API_KEY", hide_env_values = true)]
    pub sink_api_key: Option<String>,

    /// Timeout for a single commit request, in seconds
    #[arg(long, default_value = "10")]
    pub sink_timeout_secs: u64,

    /// Attempts per commit before giving up
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub sink_attempts: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// HTTP sink settings, if a backend URL was given
    pub fn sink_config(&self) -> Option<SinkConfig> {
        let url = self.sink_url.clone()?;
        Some(SinkConfig {
            api_key: self.sink_api_key.clone(),
            timeout: Duration::from_secs(self.sink_timeout_secs),
            attempts: self.sink_attempts,
            ..SinkConfig::new(url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["bt-tracker"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert!(config.sink_config().is_none());
    }

    #[test]
    fn sink_flags_build_config() {
        let config = Config::try_parse_from([
            "bt-tracker",
            "--sink-url",
            "https://example.test/rest/v1/time_entries",
            "--sink-api-key",
            "anon-key",
            "--sink-timeout-secs",
            "4",
            "--sink-attempts",
            "2",
            "-v",
        ])
        .unwrap();

        let sink = config.sink_config().unwrap();
        assert_eq!(sink.url.path(), "/rest/v1/time_entries");
        assert_eq!(sink.api_key.as_deref(), Some("anon-key"));
        assert_eq!(sink.timeout, Duration::from_secs(4));
        assert_eq!(sink.attempts, 2);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn rejects_zero_attempts() {
        assert!(Config::try_parse_from(["bt-tracker", "--sink-attempts", "0"]).is_err());
    }
}
