use crate::streaming::ProviderEvent;
use crate::types::{Message, ToolSpec};
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent>> + Send>>;

/// Streaming chat boundary every provider adapter implements.
///
/// Adapters emit text deltas as they arrive and buffer tool-call argument
/// fragments internally, so consumers only ever see complete tool calls.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub tools: Option<Vec<ToolSpec>>,
    /// Ask the provider to emit a single JSON object.
    pub json_mode: bool,
    /// Ollama context window override.
    pub num_ctx: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn num_ctx(mut self, tokens: u32) -> Self {
        self.num_ctx = Some(tokens);
        self
    }
}
