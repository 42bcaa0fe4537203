use axum::Json;
use axum::extract::State;
use packhub_types::ServerInfo;
use serde_json::json;

use crate::AppState;

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/info — node identity, used by clients when adding a channel.
pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(state.info.clone())
}
