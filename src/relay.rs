use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use tracing::error;

use crate::llm::ChunkStream;
use crate::store::HistoryStore;

/// Forward provider fragments to the client as plain text, each one as soon
/// as it arrives. On a clean finish the assembled reply is recorded as an
/// assistant turn; a mid-stream failure appends a terminal marker to the
/// already-delivered text and records nothing.
pub fn streaming_response(
    rx: ChunkStream,
    history: Arc<HistoryStore>,
    user_id: String,
) -> Response {
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(relay(rx, history, user_id)),
    )
        .into_response()
}

// When the client disconnects axum drops this stream, which drops the
// receiver; the provider task notices on its next send and stops reading.
fn relay(
    mut rx: ChunkStream,
    history: Arc<HistoryStore>,
    user_id: String,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    async_stream::stream! {
        let mut full = String::new();
        let mut failed = false;

        while let Some(result) = rx.recv().await {
            match result {
                Ok(chunk) => {
                    if !chunk.delta.is_empty() {
                        full.push_str(&chunk.delta);
                        yield Ok::<_, Infallible>(Bytes::from(chunk.delta));
                    }
                    if chunk.done {
                        break;
                    }
                }
                Err(e) => {
                    error!("stream failed mid-flight: {e}");
                    failed = true;
                    yield Ok(Bytes::from(format!("\n[stream error: {e}]")));
                    break;
                }
            }
        }

        if !failed && !full.is_empty() {
            history.record(&user_id, "assistant", full).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, StreamChunk};
    use futures::StreamExt;
    use tokio::sync::mpsc;

    fn fragment(delta: &str) -> Result<StreamChunk, LlmError> {
        Ok(StreamChunk {
            delta: delta.to_string(),
            done: false,
        })
    }

    fn finish() -> Result<StreamChunk, LlmError> {
        Ok(StreamChunk {
            delta: String::new(),
            done: true,
        })
    }

    async fn drain(rx: ChunkStream, history: Arc<HistoryStore>, user_id: &str) -> String {
        let parts: Vec<Bytes> = relay(rx, history, user_id.to_string())
            .map(|r| r.unwrap())
            .collect()
            .await;
        parts
            .iter()
            .map(|b| std::str::from_utf8(b).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn relay_concatenates_fragments_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let history = Arc::new(HistoryStore::new());
        tx.send(fragment("Hel")).await.unwrap();
        tx.send(fragment("lo")).await.unwrap();
        tx.send(finish()).await.unwrap();
        drop(tx);

        let text = drain(rx, history.clone(), "alice").await;
        assert_eq!(text, "Hello");

        let transcript = history.transcript("alice").await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, "assistant");
        assert_eq!(transcript[0].content, "Hello");
    }

    #[tokio::test]
    async fn relay_appends_terminal_marker_on_failure() {
        let (tx, rx) = mpsc::channel(8);
        let history = Arc::new(HistoryStore::new());
        tx.send(fragment("partial")).await.unwrap();
        tx.send(Err(LlmError::Parse("bad frame".into()))).await.unwrap();
        drop(tx);

        let text = drain(rx, history.clone(), "alice").await;
        assert!(text.starts_with("partial"));
        assert!(text.contains("[stream error:"));
        // A failed stream leaves no assistant turn behind.
        assert!(history.transcript("alice").await.is_empty());
    }

    #[tokio::test]
    async fn relay_skips_history_on_empty_stream() {
        let (tx, rx) = mpsc::channel(8);
        let history = Arc::new(HistoryStore::new());
        tx.send(finish()).await.unwrap();
        drop(tx);

        let text = drain(rx, history.clone(), "alice").await;
        assert!(text.is_empty());
        assert!(history.transcript("alice").await.is_empty());
    }

    #[tokio::test]
    async fn relay_records_when_channel_closes_without_done() {
        let (tx, rx) = mpsc::channel(8);
        let history = Arc::new(HistoryStore::new());
        tx.send(fragment("cut off")).await.unwrap();
        drop(tx);

        let text = drain(rx, history.clone(), "alice").await;
        assert_eq!(text, "cut off");
        assert_eq!(history.transcript("alice").await.len(), 1);
    }
}
