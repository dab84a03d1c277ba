//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{error::TimerError, state::AppState};
use super::responses::{
    ApiResponse, DescriptionRequest, DiscardRequest, HealthResponse, StatusResponse,
};

/// Error half of every timer handler: a status code plus the usual body
pub type ApiError = (StatusCode, Json<ApiResponse>);

/// Map a timer error to the status code the client sees
pub fn error_status(e: &TimerError) -> StatusCode {
    match e {
        TimerError::DescriptionRequired | TimerError::BelowMinimum { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TimerError::ConfirmationRequired => StatusCode::CONFLICT,
        TimerError::Sink(_) => StatusCode::BAD_GATEWAY,
    }
}

async fn reject(state: &AppState, e: TimerError) -> ApiError {
    let status = error_status(&e);
    if e.is_validation() {
        warn!("Rejected timer action: {}", e);
    } else {
        error!("Timer action failed: {}", e);
    }
    (status, Json(ApiResponse::error(e.to_string(), state.snapshot().await)))
}

/// Handle GET /timer - Return the timer and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.snapshot().await,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle POST /timer/start - Start or resume the timer
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.start().await;
    info!("Start endpoint called - timer at {}", timer.display);
    Json(ApiResponse::for_timer("Timer running".to_string(), timer))
}

/// Handle POST /timer/pause - Pause the timer
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.pause().await;
    info!("Pause endpoint called - timer at {}", timer.display);
    Json(ApiResponse::for_timer("Timer paused".to_string(), timer))
}

/// Handle PUT /timer/description - Set what the time is being tracked for
pub async fn description_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DescriptionRequest>,
) -> Json<ApiResponse> {
    let timer = state.set_description(request.description).await;
    Json(ApiResponse::for_timer("Description updated".to_string(), timer))
}

/// Handle POST /timer/discard - Throw away the current session
pub async fn discard_handler(
    State(state): State<Arc<AppState>>,
    request: Option<Json<DiscardRequest>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let confirmed = request.map(|Json(body)| body.confirm).unwrap_or(false);

    match state.discard(confirmed).await {
        Ok(timer) => {
            info!("Discard endpoint called - timer reset");
            Ok(Json(ApiResponse::for_timer("Timer discarded".to_string(), timer)))
        }
        Err(e) => Err(reject(&state, e).await),
    }
}

/// Handle POST /timer/commit - Save the session as a time entry
pub async fn commit_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    match state.commit().await {
        Ok((entry, timer)) => {
            info!("Commit endpoint called - saved {:.2}h", entry.hours);
            Ok(Json(ApiResponse::committed(entry, timer)))
        }
        Err(e) => Err(reject(&state, e).await),
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
