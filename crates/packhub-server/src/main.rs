mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use packhub_api::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packhub=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let data_dir = PathBuf::from(
        std::env::var("PACKHUB_DATA_DIR").unwrap_or_else(|_| "./data".into()),
    );
    let host = std::env::var("PACKHUB_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PACKHUB_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;

    std::fs::create_dir_all(&data_dir)?;
    let server_info = config::load_server_info(&data_dir)?;

    // Init database
    let db = packhub_db::Database::open(&data_dir.join("packhub.db"))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        info: server_info,
    });

    let app = packhub_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Packhub server listening on {} (data: {})", addr, data_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
