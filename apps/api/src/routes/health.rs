use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::chat::store;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "lisa-api"
    }))
}

/// GET /api/health
/// Touches the database so a dead pool shows up here and not in /api/chat.
pub async fn api_health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let sessions = store::session_count(&state.db).await?;
    Ok(Json(json!({
        "ok": true,
        "database": "up",
        "sessions": sessions
    })))
}
