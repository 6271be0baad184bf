use std::time::Duration;
use async_stream::stream;
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::{resolve_api_key, TranslateConfig};
use crate::error::{Result, VoxlateError};
use super::{ChatRequest, DeltaStream, Translator};

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Translator backed by an OpenAI-compatible chat completions deployment
/// with server-sent-event streaming.
pub struct OpenAiTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl OpenAiTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(VoxlateError::Config(
                "Translation endpoint is not configured".to_string(),
            ));
        }

        let api_key = resolve_api_key(config.api_key.as_deref(), "AZURE_OPENAI_API_KEY")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout
            .build()
            .map_err(|e| VoxlateError::Translation(format!("HTTP client creation failed: {}", e)))?;

        Ok(Self { client, config, api_key })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream> {
        let url = self.completions_url();
        let body = json!({
            "messages": [
                ChatMessage { role: "system".to_string(), content: request.system_prompt },
                ChatMessage { role: "user".to_string(), content: request.user_text },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": true,
        });

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoxlateError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VoxlateError::Translation(format!(
                "Chat completions API error {}: {}", status, error_text
            )));
        }

        let mut bytes = response.bytes_stream();

        let deltas = stream! {
            // Byte buffer: a multi-byte character may be split across chunks,
            // only complete lines are decoded.
            let mut buffer = BytesMut::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(VoxlateError::Translation(format!(
                            "Stream interrupted: {}", e
                        )));
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                    let line = buffer.split_to(newline + 1);
                    let line = String::from_utf8_lossy(&line);
                    let Some(payload) = data_payload(line.trim()) else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        return;
                    }
                    match delta_content(payload) {
                        Ok(Some(content)) => yield Ok(content),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(deltas))
    }
}

/// Extract the payload of an SSE `data:` line, if the line carries one.
fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Decode one streamed chunk and return its delta content, if any.
fn delta_content(payload: &str) -> Result<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(payload)
        .map_err(|e| VoxlateError::Translation(format!("Failed to parse stream chunk: {}", e)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty()))
}
