//! REST API route definitions

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use stripviz_core::ModeInfo;

use super::handlers::{ApiResponse, SetModeRequest, StatusResponse};
use super::server::AppState;

/// Build the API router
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/modes", get(get_modes))
        .route("/api/mode", get(get_mode).post(set_mode))
}

/// GET /api/status - Get system status
async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let status = StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        channel_count: state.channel_count,
        mode: state.modes.current().into(),
    };

    Json(ApiResponse::success(status))
}

/// GET /api/modes - List selectable modes in presentation order
async fn get_modes(State(state): State<AppState>) -> Json<ApiResponse<Vec<ModeInfo>>> {
    Json(ApiResponse::success(state.modes.list_modes()))
}

/// GET /api/mode - Get the active mode
async fn get_mode(State(state): State<AppState>) -> Json<ApiResponse<ModeInfo>> {
    Json(ApiResponse::success(state.modes.current().into()))
}

/// POST /api/mode - Switch mode
async fn set_mode(
    State(state): State<AppState>,
    payload: Result<Json<SetModeRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse<ModeInfo>>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let msg = format!("Invalid request body: {}", rejection.body_text());
            tracing::warn!("{}", msg);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)));
        }
    };

    let id = match request.validate() {
        Ok(id) => id,
        Err(msg) => {
            tracing::warn!("Invalid set mode request: {}", msg);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)));
        }
    };

    if !state.modes.set_mode(id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Unknown mode: {}", id))),
        );
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(state.modes.current().into())),
    )
}
