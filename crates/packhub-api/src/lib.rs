pub mod auth;
pub mod error;
pub mod info;
pub mod packs;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use packhub_db::Database;
use packhub_types::{ErrorBody, PackKind, ServerInfo};

pub use error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub info: ServerInfo,
}

/// Full API surface. Rule packs and memo packs share one handler set,
/// dispatched by the kind extension on each sub-router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(info::health))
        .route("/api/info", get(info::server_info))
        .route("/api/register", post(auth::register))
        .route("/api/me", get(auth::me))
        .merge(pack_routes(PackKind::Rule))
        .merge(pack_routes(PackKind::Memo))
        .fallback(not_found)
        .with_state(state)
}

fn pack_routes(kind: PackKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.collection());
    Router::new()
        .route(&base, get(packs::list).post(packs::publish))
        .route(
            &format!("{base}/{{id}}"),
            get(packs::get_one).put(packs::update).delete(packs::remove),
        )
        .route(&format!("{base}/{{id}}/download"), get(packs::download))
        .layer(Extension(kind))
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".to_string(),
        }),
    )
}

/// Run a store call off the async runtime. The store serializes everything
/// through one connection, so every call through here is blocking.
pub(crate) async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}")))?
        .map_err(ApiError::Internal)
}
