//! HTTP surface
//!
//! Thin JSON plumbing over the pipeline: a health probe, the query entry
//! point, and the index rebuild entry point. The pipeline sits behind an
//! RwLock because both `/ask` (mode switches) and `/ingest` (wholesale index
//! replacement) mutate it; request handling itself is single-flight per
//! write-lock holder, per the core's concurrency model.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{DocqError, Result};
use crate::pipeline::RagPipeline;
use crate::store::Source;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RwLock<RagPipeline>>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct AskPayload {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/ingest", post(ingest))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DocqError::Io {
            source: e,
            context: format!("Failed to bind {}", addr),
        })?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.map_err(|e| DocqError::Io {
        source: e,
        context: "Server error".to_string(),
    })?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskPayload>,
) -> std::result::Result<Json<AskResponse>, (StatusCode, String)> {
    let mut pipeline = state.pipeline.write().await;
    let (answer, sources) = pipeline
        .answer(&payload.query, payload.top_k)
        .await
        .map_err(|e| {
            tracing::error!("Query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(AskResponse { answer, sources }))
}

async fn ingest(
    State(state): State<AppState>,
) -> std::result::Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut pipeline = state.pipeline.write().await;
    let chunks = pipeline
        .rebuild_index(&state.config.paths.data_dir, &state.config.chunking)
        .map_err(|e| {
            tracing::error!("Index rebuild failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(json!({
        "ok": true,
        "indexed_dir": state.config.paths.data_dir,
        "chunks": chunks,
    })))
}
