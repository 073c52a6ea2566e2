use std::collections::VecDeque;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::streaming::ProviderEvent;
use crate::traits::{ChatRequest, EventStream, ProviderClient};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Streaming client for the Ollama `/api/chat` endpoint.
///
/// Ollama streams newline-delimited JSON rather than SSE, and delivers tool
/// calls whole instead of as argument fragments.
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    arguments: Value,
}

impl OllamaClient {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_payload(request: &ChatRequest) -> Result<Value> {
        let mut payload = json!({
            "model": request.model,
            "messages": serde_json::to_value(&request.messages)?,
            "stream": true,
        });

        let obj = payload
            .as_object_mut()
            .context("Chat payload must be a JSON object")?;

        if let Some(tools) = &request.options.tools {
            obj.insert("tools".to_string(), serde_json::to_value(tools)?);
        }

        if request.options.json_mode {
            obj.insert("format".to_string(), json!("json"));
        }

        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.options.temperature {
            options.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(num_ctx) = request.options.num_ctx {
            options.insert("num_ctx".to_string(), json!(num_ctx));
        }
        if !options.is_empty() {
            obj.insert("options".to_string(), Value::Object(options));
        }

        Ok(payload)
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = Self::build_payload(&request)?;
        let url = format!("{}/api/chat", self.base_url);

        tracing::debug!(model = %request.model, url = %url, "starting ollama chat stream");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama API error ({}): {}", status, body);
        }

        let stream = response.bytes_stream();

        Ok(Box::pin(async_stream::stream! {
            let mut byte_chunks = Box::pin(stream);
            let mut buffer = VecDeque::with_capacity(8192);
            let mut finished = false;

            while let Some(chunk_result) = byte_chunks.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        buffer.extend(bytes);

                        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                            let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                            if let Ok(line_str) = std::str::from_utf8(&line_bytes) {
                                let line = line_str.trim();

                                if line.is_empty() {
                                    continue;
                                }

                                match serde_json::from_str::<OllamaStreamChunk>(line) {
                                    Ok(chunk) => {
                                        if let Some(message) = &chunk.message {
                                            if let Some(content) = &message.content {
                                                if !content.is_empty() {
                                                    yield Ok(ProviderEvent::TextDelta {
                                                        text: content.clone(),
                                                    });
                                                }
                                            }

                                            if let Some(tool_calls) = &message.tool_calls {
                                                for tc in tool_calls {
                                                    yield Ok(ProviderEvent::ToolCall {
                                                        name: tc.function.name.clone(),
                                                        arguments: tc.function.arguments.clone(),
                                                    });
                                                }
                                            }
                                        }

                                        if chunk.done {
                                            yield Ok(ProviderEvent::Finish {
                                                reason: chunk.done_reason.clone(),
                                            });
                                            finished = true;
                                            break;
                                        }
                                    }
                                    Err(e) => yield Err(anyhow::anyhow!("Failed to parse Ollama chunk: {}", e)),
                                }
                            }
                        }
                    }
                    Err(e) => yield Err(anyhow::anyhow!("Stream error: {}", e)),
                }

                if finished {
                    break;
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatOptions;
    use crate::types::Message;

    #[test]
    fn payload_sets_json_format_and_num_ctx() {
        let request = ChatRequest::new("qwen3", vec![Message::user("hi")])
            .with_options(ChatOptions::new().json_mode().num_ctx(16384));
        let payload = OllamaClient::build_payload(&request).unwrap();
        assert_eq!(payload["format"], "json");
        assert_eq!(payload["options"]["num_ctx"], 16384);
    }

    #[test]
    fn payload_omits_options_when_empty() {
        let request = ChatRequest::new("qwen3", vec![Message::user("hi")]);
        let payload = OllamaClient::build_payload(&request).unwrap();
        assert!(payload.get("options").is_none());
        assert!(payload.get("format").is_none());
    }

    #[test]
    fn parses_tool_call_chunk() {
        let chunk: OllamaStreamChunk = serde_json::from_str(
            r#"{"message":{"content":"","tool_calls":[{"function":{"name":"search","arguments":{"query":"rust"}}}]},"done":false}"#,
        )
        .unwrap();
        let message = chunk.message.unwrap();
        let calls = message.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "search");
        assert_eq!(calls[0].function.arguments["query"], "rust");
    }

    #[test]
    fn parses_done_chunk() {
        let chunk: OllamaStreamChunk =
            serde_json::from_str(r#"{"message":{"content":""},"done":true,"done_reason":"stop"}"#)
                .unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.done_reason.as_deref(), Some("stop"));
    }
}
