use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::api::{self, AppState};
use super::db::{DbHandle, IssueDb};
use super::embedded::Assets;
use super::store::{MemoryStore, SharedStore};
use crate::config::{StoreBackend, TrackerConfig};

/// Build the full application router with API and UI serving.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .fallback(static_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve embedded static files or fall back to index.html.
async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    if !path.is_empty() {
        if let Some(content) = Assets::get(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response();
        }
    }

    match Assets::get("index.html") {
        Some(content) => Html(String::from_utf8_lossy(&content.data).to_string()).into_response(),
        None => (StatusCode::NOT_FOUND, "Frontend not found.").into_response(),
    }
}

/// Open the record store selected by the configuration.
pub fn open_store(config: &TrackerConfig) -> Result<SharedStore> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; issues will be lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = &config.store.path;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
            let db = IssueDb::new(path).context("Failed to initialize issue database")?;
            tracing::info!(path = %path.display(), "opened issue database");
            Ok(Arc::new(DbHandle::new(db)))
        }
    }
}

/// Start the issue tracker server.
pub async fn start_server(config: TrackerConfig) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let store = open_store(&config)?;
    let state = Arc::new(AppState::new(store));

    let mut app = build_router(state);
    if config.server.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Issue tracker running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
