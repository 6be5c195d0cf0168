pub mod models;

use chrono::Utc;
use models::{ChatTurn, DocumentIndex, IndexInfo, RagStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-user document indexes. Uploads build a complete index off to the
/// side and install it here with one map insert, so a concurrent reader
/// holds either the old snapshot or the new one, never a mix. Nothing is
/// ever evicted; growth across distinct users is bounded only by memory.
#[derive(Default)]
pub struct IndexStore {
    indexes: RwLock<HashMap<String, Arc<DocumentIndex>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a finished index for its owner. Returns true when an earlier
    /// index was replaced.
    pub async fn publish(&self, index: DocumentIndex) -> bool {
        let mut indexes = self.indexes.write().await;
        indexes
            .insert(index.user_id.clone(), Arc::new(index))
            .is_some()
    }

    /// Snapshot of the owner's current index, if any.
    pub async fn get(&self, user_id: &str) -> Option<Arc<DocumentIndex>> {
        let indexes = self.indexes.read().await;
        indexes.get(user_id).cloned()
    }

    pub async fn status(&self, user_id: &str) -> RagStatus {
        match self.get(user_id).await {
            Some(index) => RagStatus {
                user_id: user_id.to_string(),
                has_index: true,
                index_info: Some(IndexInfo {
                    filename: index.filename.clone(),
                    upload_time: index.uploaded_at,
                    text_length: index.text_length,
                }),
            },
            None => RagStatus {
                user_id: user_id.to_string(),
                has_index: false,
                index_info: None,
            },
        }
    }

    /// Number of owners currently holding an index.
    pub async fn count(&self) -> usize {
        self.indexes.read().await.len()
    }
}

/// Append-only per-user transcripts. Turns are recorded as chats complete
/// and never fed back into prompts; `GET /conversations` reads them out.
#[derive(Default)]
pub struct HistoryStore {
    transcripts: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, user_id: &str, role: &str, content: impl Into<String>) {
        let mut transcripts = self.transcripts.write().await;
        transcripts
            .entry(user_id.to_string())
            .or_default()
            .push(ChatTurn {
                role: role.to_string(),
                content: content.into(),
                timestamp: Utc::now(),
            });
    }

    pub async fn transcript(&self, user_id: &str) -> Vec<ChatTurn> {
        let transcripts = self.transcripts.read().await;
        transcripts.get(user_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::TextChunk;

    fn index(user_id: &str, filename: &str, chunk_texts: &[&str]) -> DocumentIndex {
        DocumentIndex {
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
            text_length: chunk_texts.iter().map(|t| t.len()).sum(),
            chunks: chunk_texts
                .iter()
                .enumerate()
                .map(|(i, t)| TextChunk {
                    text: t.to_string(),
                    embedding: vec![1.0, 0.0],
                    sequence_index: i,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn publish_then_status_reports_metadata() {
        let store = IndexStore::new();
        let replaced = store.publish(index("alice", "notes.txt", &["hello"])).await;
        assert!(!replaced);

        let status = store.status("alice").await;
        assert!(status.has_index);
        let info = status.index_info.unwrap();
        assert_eq!(info.filename, "notes.txt");
        assert_eq!(info.text_length, 5);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn republish_replaces_wholesale() {
        let store = IndexStore::new();
        store
            .publish(index("alice", "first.txt", &["aaa", "bbb"]))
            .await;
        let replaced = store.publish(index("alice", "second.txt", &["ccc"])).await;
        assert!(replaced);

        let status = store.status("alice").await;
        assert_eq!(status.index_info.unwrap().filename, "second.txt");
        let current = store.get("alice").await.unwrap();
        assert_eq!(current.chunks.len(), 1);
        assert_eq!(current.chunks[0].text, "ccc");
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn snapshot_survives_replacement() {
        let store = IndexStore::new();
        store.publish(index("alice", "first.txt", &["aaa"])).await;
        let snapshot = store.get("alice").await.unwrap();

        store.publish(index("alice", "second.txt", &["bbb"])).await;
        // The reader's snapshot is untouched by the swap.
        assert_eq!(snapshot.filename, "first.txt");
        assert_eq!(snapshot.chunks[0].text, "aaa");
    }

    #[tokio::test]
    async fn missing_user_has_no_index() {
        let store = IndexStore::new();
        assert!(store.get("nobody").await.is_none());
        let status = store.status("nobody").await;
        assert!(!status.has_index);
        assert!(status.index_info.is_none());
    }

    #[tokio::test]
    async fn history_records_in_order() {
        let history = HistoryStore::new();
        history.record("alice", "user", "hi").await;
        history.record("alice", "assistant", "hello").await;

        let transcript = history.transcript("alice").await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, "user");
        assert_eq!(transcript[1].content, "hello");
        assert!(history.transcript("bob").await.is_empty());
    }
}
