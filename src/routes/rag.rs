use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{require, AppState};
use crate::doc_processor::{self, CHUNK_OVERLAP, CHUNK_SIZE};
use crate::embedding;
use crate::error::ApiError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::relay::streaming_response;
use crate::store::models::{DocumentIndex, RagStatus, TextChunk};

/// Fixed system turn for retrieval-augmented chats; the retrieved context
/// rides in the user turn instead.
pub const RAG_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer the user's question based ONLY on the provided context. If the answer cannot be found in the context, say 'I cannot find the answer in the provided documents.'";

/// Chunks embedded per provider call during ingest.
const EMBED_BATCH: usize = 20;
/// Chunks retrieved as context for each query.
const TOP_K: usize = 3;

#[derive(Debug, Deserialize)]
pub struct RagChatBody {
    pub user_message: String,
    #[serde(default)]
    pub model: Option<String>,
    pub api_key: String,
    pub user_id: String,
}

/// Ingest one uploaded document: extract text, chunk it, embed every chunk,
/// then swap the finished index in for this user. Any prior index is
/// replaced outright.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut api_key = String::new();
    let mut user_id = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read file: {e}")))?;
                file = Some((filename, bytes));
            }
            "api_key" => {
                api_key = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read api_key: {e}")))?;
            }
            "user_id" => {
                user_id = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read user_id: {e}")))?;
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::Validation("file field is required".to_string()))?;
    require("api_key", &api_key)?;
    require("user_id", &user_id)?;

    let doc = doc_processor::extract_text(&filename, &bytes)?;
    let text_length = doc.text.chars().count();
    let chunk_texts = doc_processor::chunk_text(&doc.text, CHUNK_SIZE, CHUNK_OVERLAP);

    let mut chunks: Vec<TextChunk> = Vec::with_capacity(chunk_texts.len());
    for batch in chunk_texts.chunks(EMBED_BATCH) {
        let embeddings = state.provider.embed(&api_key, batch).await?;
        if embeddings.len() != batch.len() {
            return Err(ApiError::Upstream(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }
        for (text, embedding) in batch.iter().zip(embeddings) {
            chunks.push(TextChunk {
                text: text.clone(),
                embedding,
                sequence_index: chunks.len(),
            });
        }
    }

    let chunk_count = chunks.len();
    let index = DocumentIndex {
        user_id: user_id.clone(),
        filename: filename.clone(),
        uploaded_at: Utc::now(),
        text_length,
        chunks,
    };
    let replaced = state.indexes.publish(index).await;
    let total_indexes = state.indexes.count().await;
    info!(
        user_id = %user_id,
        filename = %filename,
        file_type = %doc.file_type,
        chunks = chunk_count,
        replaced,
        total_indexes,
        "indexed document"
    );

    Ok(Json(json!({
        "message": "Document indexed successfully",
        "filename": filename,
        "text_length": text_length,
        "chunk_count": chunk_count,
        "user_id": user_id,
    })))
}

/// Answer a query against the caller's indexed document. The top chunks by
/// cosine similarity are joined into a context block and prepended to the
/// user message before the exchange is relayed upstream.
pub async fn rag_chat(
    State(state): State<AppState>,
    Json(body): Json<RagChatBody>,
) -> Result<Response, ApiError> {
    require("user_message", &body.user_message)?;
    require("api_key", &body.api_key)?;
    require("user_id", &body.user_id)?;

    // A missing index must surface before the provider is touched at all.
    let index = state
        .indexes
        .get(&body.user_id)
        .await
        .ok_or_else(|| ApiError::NotFound(body.user_id.clone()))?;

    let query_embeddings = state
        .provider
        .embed(&body.api_key, std::slice::from_ref(&body.user_message))
        .await?;
    let query_embedding = query_embeddings
        .first()
        .ok_or_else(|| ApiError::Upstream("provider returned no query embedding".to_string()))?;

    let hits = embedding::top_k(query_embedding, &index.chunks, TOP_K);
    let context = hits
        .iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let augmented = format!("Context:\n{context}\n\nQuestion: {}", body.user_message);

    let model = body
        .model
        .unwrap_or_else(|| state.config.provider.chat_model.clone());
    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(RAG_SYSTEM_PROMPT),
            ChatMessage::user(augmented),
        ],
        model,
    };

    info!(user_id = %body.user_id, hits = hits.len(), model = %request.model, "rag chat request");
    let rx = state.provider.stream_chat(&body.api_key, request).await?;

    state
        .history
        .record(&body.user_id, "user", &body.user_message)
        .await;
    Ok(streaming_response(rx, state.history.clone(), body.user_id))
}

pub async fn rag_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<RagStatus> {
    Json(state.indexes.status(&user_id).await)
}
