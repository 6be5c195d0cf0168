pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub delta: String,
    pub done: bool,
}

/// Fragments of one streaming completion, in arrival order. The channel
/// closes after a `done` chunk or a terminal error; dropping the receiver
/// cancels the underlying provider call.
pub type ChunkStream = mpsc::Receiver<Result<StreamChunk, LlmError>>;

/// The narrow provider capability the rest of the service depends on:
/// embedding texts and streaming a chat completion. Handlers only ever see
/// this trait, so tests can swap in a fake without any HTTP.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn embed(&self, api_key: &str, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    async fn stream_chat(
        &self,
        api_key: &str,
        request: ChatRequest,
    ) -> Result<ChunkStream, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// True when the provider rejected the caller's credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, LlmError::Api { status: 401 | 403, .. })
    }
}
