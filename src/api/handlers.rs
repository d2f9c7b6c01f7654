//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, warn};

use crate::{
    error::TimerError,
    services::AlarmSettings,
    state::{AppState, TimerSnapshot},
};
use super::responses::{ApiResponse, HealthResponse, SessionsResponse, StatusResponse};

type CommandResult = Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)>;

/// HTTP status for a failed timer command
pub fn error_status(error: &TimerError) -> StatusCode {
    match error {
        TimerError::NoShift => StatusCode::NOT_FOUND,
        TimerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TimerError::Store { .. } | TimerError::Unpersisted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        TimerError::StatePoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn command_response(
    action: &str,
    result: Result<TimerSnapshot, (TimerError, TimerSnapshot)>,
) -> CommandResult {
    match result {
        Ok(snapshot) => Ok(Json(ApiResponse::ok(
            format!("{} accepted, timer is {}", action, snapshot.status),
            snapshot,
        ))),
        Err((e, snapshot)) => {
            let code = error_status(&e);
            if code.is_server_error() {
                error!("{} failed: {}", action, e);
            } else {
                warn!("{} rejected: {}", action, e);
            }
            Err((code, Json(ApiResponse::error(e.to_string(), snapshot))))
        }
    }
}

/// Handle POST /start - Clock in to the current shift
pub async fn start_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response("start", state.start())
}

/// Handle POST /pause - Freeze the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response("pause", state.pause())
}

/// Handle POST /resume - Continue a paused countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response("resume", state.resume())
}

/// Handle POST /stop - Clock out
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response("stop", state.stop())
}

/// Handle POST /reset - Close any open session and re-evaluate
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_response("reset", state.reset())
}

/// Handle POST /refresh - Reload shift and session state
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    match state.refresh() {
        Ok(snapshot) => Ok(Json(ApiResponse::ok(
            format!("refreshed, timer is {}", snapshot.status),
            snapshot,
        ))),
        Err(e) => {
            error!("Refresh failed: {}", e);
            Err((
                error_status(&e),
                Json(ApiResponse::error(e.to_string(), state.get_snapshot())),
            ))
        }
    }
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let alarm = match state.alarm_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to get alarm settings: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer: state.get_snapshot(),
        alarm,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /sessions - Session history for the current shift
pub async fn sessions_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionsResponse>, StatusCode> {
    match state.session_history() {
        Ok(sessions) => Ok(Json(SessionsResponse {
            shift_id: state.get_snapshot().shift.map(|s| s.id),
            sessions,
        })),
        Err(e) => {
            error!("Failed to read session history: {}", e);
            Err(error_status(&e))
        }
    }
}

/// Handle POST /alarm-settings - Change alarm sound and volume
pub async fn alarm_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<AlarmSettings>,
) -> Result<Json<AlarmSettings>, StatusCode> {
    if settings.volume > 100 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state.set_alarm_settings(settings) {
        Ok(()) => Ok(Json(settings)),
        Err(e) => {
            error!("Failed to update alarm settings: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
