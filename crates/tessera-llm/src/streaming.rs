use std::collections::BTreeMap;
use std::collections::VecDeque;

use anyhow::Result;
use futures::StreamExt;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::EventStream;

/// Normalized event emitted by every provider adapter.
///
/// Tool-call argument fragments are aggregated inside the adapter, so a
/// `ToolCall` always carries the complete arguments object.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Incremental assistant text.
    TextDelta { text: String },

    /// Fully assembled tool invocation request.
    ToolCall { name: String, arguments: Value },

    /// End of the model turn.
    Finish { reason: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub tool_type: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// Accumulates streamed tool-call fragments until the turn finishes.
#[derive(Debug, Default, Clone)]
pub(crate) struct PendingToolCall {
    name: String,
    arguments: String,
}

impl PendingToolCall {
    pub(crate) fn absorb(&mut self, delta: &ToolCallDelta) {
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                self.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                self.arguments.push_str(arguments);
            }
        }
    }

    pub(crate) fn complete(self) -> Option<ProviderEvent> {
        if self.name.is_empty() {
            return None;
        }
        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&self.arguments)
                .unwrap_or_else(|_| Value::String(self.arguments.clone()))
        };
        Some(ProviderEvent::ToolCall {
            name: self.name,
            arguments,
        })
    }
}

/// Parses an OpenAI-compatible `chat/completions` SSE body into provider
/// events. Text deltas pass through as they arrive; tool-call fragments are
/// keyed by index and flushed as complete calls once the stream ends.
pub fn parse_chat_sse_stream(response: Response) -> EventStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);
        let mut pending: BTreeMap<u32, PendingToolCall> = BTreeMap::new();
        let mut finish_reason: Option<String> = None;
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

                            if let Some(data) = line.strip_prefix("data: ") {
                                if data == "[DONE]" {
                                    finished = true;
                                    break;
                                }

                                match serde_json::from_str::<ChatStreamChunk>(data) {
                                    Ok(chunk) => {
                                        if let Some(choice) = chunk.choices.first() {
                                            if let Some(content) = &choice.delta.content {
                                                if !content.is_empty() {
                                                    yield Ok(ProviderEvent::TextDelta {
                                                        text: content.clone(),
                                                    });
                                                }
                                            }

                                            if let Some(tool_calls) = &choice.delta.tool_calls {
                                                for tc in tool_calls {
                                                    pending.entry(tc.index).or_default().absorb(tc);
                                                }
                                            }

                                            if let Some(reason) = &choice.finish_reason {
                                                finish_reason = Some(reason.clone());
                                                finished = true;
                                            }
                                        }
                                    }
                                    Err(e) => yield Err(anyhow::anyhow!("Failed to parse chat chunk: {}", e)),
                                }
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

        if finished {
            for (_, call) in std::mem::take(&mut pending) {
                if let Some(event) = call.complete() {
                    tracing::debug!(?event, "flushing aggregated tool call");
                    yield Ok(event);
                }
            }
            yield Ok(ProviderEvent::Finish { reason: finish_reason });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn function_delta(name: Option<&str>, arguments: Option<&str>) -> ToolCallDelta {
        ToolCallDelta {
            index: 0,
            id: None,
            tool_type: None,
            function: Some(FunctionDelta {
                name: name.map(String::from),
                arguments: arguments.map(String::from),
            }),
        }
    }

    #[test]
    fn deserializes_content_chunk() {
        let chunk: ChatStreamChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"content":"hello"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hello"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn deserializes_tool_call_fragment() {
        let chunk: ChatStreamChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"search","arguments":"{\"qu"}}]},"finish_reason":null}]}"#,
        )
        .unwrap();
        let calls = chunk.choices[0].delta.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.as_ref().unwrap().name.as_deref(), Some("search"));
    }

    #[test]
    fn aggregates_split_arguments() {
        let mut pending = PendingToolCall::default();
        pending.absorb(&function_delta(Some("search"), Some("{\"query\":")));
        pending.absorb(&function_delta(None, Some("\"rust\"}")));

        let event = pending.complete().unwrap();
        assert_eq!(
            event,
            ProviderEvent::ToolCall {
                name: "search".to_string(),
                arguments: json!({"query": "rust"}),
            }
        );
    }

    #[test]
    fn empty_arguments_become_empty_object() {
        let mut pending = PendingToolCall::default();
        pending.absorb(&function_delta(Some("get_latest_release"), None));

        let event = pending.complete().unwrap();
        assert_eq!(
            event,
            ProviderEvent::ToolCall {
                name: "get_latest_release".to_string(),
                arguments: json!({}),
            }
        );
    }

    #[test]
    fn malformed_arguments_fall_back_to_raw_string() {
        let mut pending = PendingToolCall::default();
        pending.absorb(&function_delta(Some("search"), Some("{not json")));

        let event = pending.complete().unwrap();
        assert_eq!(
            event,
            ProviderEvent::ToolCall {
                name: "search".to_string(),
                arguments: Value::String("{not json".to_string()),
            }
        );
    }

    #[test]
    fn nameless_call_is_dropped() {
        let mut pending = PendingToolCall::default();
        pending.absorb(&function_delta(None, Some("{}")));
        assert!(pending.complete().is_none());
    }
}
