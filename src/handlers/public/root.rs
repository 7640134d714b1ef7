use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET / - service descriptor
pub async fn root(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "School directory API",
        "environment": state.config.environment.as_str(),
        "endpoints": {
            "health": "GET /health",
            "schools": [
                "GET /api/schools",
                "GET /api/schools/:id",
                "POST /api/schools",
                "PUT /api/schools/:id",
                "DELETE /api/schools/:id"
            ],
            "media": ["POST /api/media"],
            "auth": ["GET /api/auth/me", "POST /api/auth/create-employee"]
        }
    }))
}

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.schools.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok", "timestamp": timestamp })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable", "timestamp": timestamp })),
            )
        }
    }
}
