// Exercises the HTTP commit sink against a mock backend: headers, payload,
// retry on transient failures and the request timeout.

use std::time::Duration;

use assert_matches::assert_matches;
use bt_tracker::{
    error::SinkError,
    services::{CommitSink, HttpSink, SinkConfig},
    state::TimeEntry,
};
use chrono::NaiveDate;
use reqwest::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry() -> TimeEntry {
    TimeEntry::from_session(
        "Lighting design",
        185_000,
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
    )
}

fn config(server: &MockServer) -> SinkConfig {
    let url = Url::parse(&format!("{}/rest/v1/time_entries", server.uri())).unwrap();
    SinkConfig {
        backoff_base: Duration::from_millis(10),
        ..SinkConfig::new(url)
    }
}

#[tokio::test]
async fn posts_entry_with_api_key() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/time_entries"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(body_json(serde_json::json!({
            "description": "Lighting design",
            "hours": 0.05,
            "date": "2024-05-17",
            "billable": true,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpSink::new(SinkConfig {
        api_key: Some("anon-key".to_string()),
        ..config(&server)
    })?;
    sink.commit(&entry()).await?;

    Ok(())
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpSink::new(config(&server))?;
    sink.commit(&entry()).await?;

    Ok(())
}

#[tokio::test]
async fn gives_up_after_configured_attempts() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let sink = HttpSink::new(config(&server))?;
    let result = sink.commit(&entry()).await;

    assert_matches!(result, Err(SinkError::Status { status: 500, ref body }) if body == "boom");
    Ok(())
}

#[tokio::test]
async fn client_errors_are_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpSink::new(config(&server))?;
    assert_matches!(
        sink.commit(&entry()).await,
        Err(SinkError::Status { status: 401, .. })
    );
    Ok(())
}

#[tokio::test]
async fn slow_backend_times_out() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let sink = HttpSink::new(SinkConfig {
        timeout: Duration::from_millis(100),
        attempts: 1,
        ..config(&server)
    })?;

    assert_matches!(
        sink.commit(&entry()).await,
        Err(SinkError::Timeout { timeout_ms: 100 })
    );
    Ok(())
}
