use super::{ChatRequest, ChunkStream, LlmError, Provider, StreamChunk};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// OpenAI-compatible HTTP backend. The caller's API key travels with each
/// request rather than living on the struct, so one instance serves every
/// user of the relay.
pub struct OpenAi {
    client: Client,
    base_url: String,
    embedding_model: String,
}

impl OpenAi {
    pub fn new(base_url: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            embedding_model: embedding_model.into(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiStreamResponse {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Pull every complete line out of the buffer, leaving a trailing partial
/// line in place. Splitting happens on the raw bytes: 0x0A never occurs
/// inside a multibyte UTF-8 sequence, so a character that arrives split
/// across network chunks stays buffered until its line completes.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&line).trim().to_string());
    }
    lines
}

#[async_trait]
impl Provider for OpenAi {
    async fn embed(&self, api_key: &str, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let mut req = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if !api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status,
                message: text,
            });
        }

        let data: EmbeddingResponse = resp.json().await?;
        Ok(data.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn stream_chat(
        &self,
        api_key: &str,
        request: ChatRequest,
    ) -> Result<ChunkStream, LlmError> {
        let messages: Vec<OpenAiMessage> = request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let body = OpenAiRequest {
            model: request.model.clone(),
            messages,
            stream: true,
        };

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if !api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let resp = req.send().await?;

        // Status problems (bad key, bad model) surface here as a plain error;
        // only a healthy response becomes a stream.
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status,
                message: text,
            });
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = resp.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Http(e))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                for line in drain_lines(&mut buffer) {
                    if let Some(data) = line.strip_prefix("data: ") {
                        if data == "[DONE]" {
                            let _ = tx
                                .send(Ok(StreamChunk {
                                    delta: String::new(),
                                    done: true,
                                }))
                                .await;
                            return;
                        }

                        if let Ok(parsed) = serde_json::from_str::<OpenAiStreamResponse>(data) {
                            if let Some(choice) = parsed.choices.first() {
                                if let Some(content) = &choice.delta.content {
                                    // A closed receiver means the caller hung up;
                                    // stop reading so the connection is released.
                                    if tx
                                        .send(Ok(StreamChunk {
                                            delta: content.clone(),
                                            done: false,
                                        }))
                                        .await
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                                if choice.finish_reason.is_some() {
                                    let _ = tx
                                        .send(Ok(StreamChunk {
                                            delta: String::new(),
                                            done: true,
                                        }))
                                        .await;
                                    return;
                                }
                            }
                        }
                    }
                }
            }

            let _ = tx
                .send(Ok(StreamChunk {
                    delta: String::new(),
                    done: true,
                }))
                .await;
        });

        Ok(rx)
    }
}
