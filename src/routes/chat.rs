use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{require, AppState};
use crate::error::ApiError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::relay::streaming_response;
use crate::store::models::ChatTurn;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub developer_message: String,
    pub user_message: String,
    #[serde(default)]
    pub model: Option<String>,
    pub api_key: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub user_id: String,
    pub conversations: Vec<ChatTurn>,
    pub total_messages: usize,
}

/// Relay one chat exchange as a plain-text stream. The developer message
/// and user message become the two turns sent upstream; nothing else is
/// folded into the prompt.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    require("user_message", &body.user_message)?;
    require("api_key", &body.api_key)?;
    require("user_id", &body.user_id)?;

    let model = body
        .model
        .unwrap_or_else(|| state.config.provider.chat_model.clone());
    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(body.developer_message),
            ChatMessage::user(body.user_message.clone()),
        ],
        model,
    };

    info!(user_id = %body.user_id, model = %request.model, "chat request");
    let rx = state.provider.stream_chat(&body.api_key, request).await?;

    // The user turn is recorded only once the upstream call is accepted, so
    // rejected requests leave no trace in the transcript.
    state
        .history
        .record(&body.user_id, "user", &body.user_message)
        .await;
    Ok(streaming_response(rx, state.history.clone(), body.user_id))
}

pub async fn conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ConversationsResponse> {
    let turns = state.history.transcript(&user_id).await;
    Json(ConversationsResponse {
        user_id,
        total_messages: turns.len(),
        conversations: turns,
    })
}
