use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextChunk {
    pub text: String,
    pub embedding: Vec<f32>,
    pub sequence_index: usize,
}

/// One user's indexed document. Rebuilt from scratch on every upload; the
/// store swaps the whole value so readers never see a partial index.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentIndex {
    pub user_id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub text_length: usize,
    pub chunks: Vec<TextChunk>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IndexInfo {
    pub filename: String,
    pub upload_time: DateTime<Utc>,
    pub text_length: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RagStatus {
    pub user_id: String,
    pub has_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_info: Option<IndexInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
