//! bt-tracker - A persistent work timer
//!
//! This is the main entry point for the bt-tracker daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use bt_tracker::{
    api::create_router,
    config::Config,
    services::{CommitSink, FileStore, HttpSink, RecordingSink},
    state::{AppState, TimerController},
    tasks::sampler_task,
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("bt_tracker={},tower_http=info", config.log_level()))
        .init();

    info!("Starting bt-tracker v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, state_file={}",
          config.host, config.port, config.state_file.display());

    let sink: Arc<dyn CommitSink> = match config.sink_config() {
        Some(sink_config) => {
            info!("Committing time entries to {}", sink_config.url);
            Arc::new(HttpSink::new(sink_config)?)
        }
        None => {
            info!("No sink URL configured, committed entries are only logged");
            Arc::new(RecordingSink::new())
        }
    };

    // Restore the timer from local storage
    let store = Arc::new(FileStore::new(config.state_file.clone()));
    let controller = TimerController::load(Arc::new(SystemClock), store);
    let state = Arc::new(AppState::new(controller, sink, config.port, config.host.clone()));

    // Start the clock sampler background task
    let sampler_state = Arc::clone(&state);
    tokio::spawn(async move {
        sampler_task(sampler_state).await;
    });

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer             - Current timer and server status");
    info!("  POST /timer/start       - Start or resume the timer");
    info!("  POST /timer/pause       - Pause the timer");
    info!("  PUT  /timer/description - Set the work description");
    info!("  POST /timer/discard     - Discard the session ({{\"confirm\": true}})");
    info!("  POST /timer/commit      - Save the session as a time entry");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.flush().await;
    info!("Server shutdown complete");
    Ok(())
}
