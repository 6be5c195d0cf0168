pub mod chat;
pub mod rag;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::llm::Provider;
use crate::store::{HistoryStore, IndexStore};

/// Uploads larger than this are rejected before extraction.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub indexes: Arc<IndexStore>,
    pub history: Arc<HistoryStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn Provider>, config: AppConfig) -> Self {
        Self {
            provider,
            indexes: Arc::new(IndexStore::new()),
            history: Arc::new(HistoryStore::new()),
            config: Arc::new(config),
        }
    }
}

/// The full HTTP surface. CORS is wide open: callers hold their own API
/// keys and nothing here is privileged.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route("/conversations/:user_id", get(chat::conversations))
        .route("/upload", post(rag::upload))
        .route("/rag-chat", post(rag::rag_chat))
        .route("/rag-status/:user_id", get(rag::rag_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}
