use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatRequest, EventStream, ProviderClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Streaming client for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different OpenAI-compatible endpoint.
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

        if let Some(temperature) = request.options.temperature {
            obj.insert("temperature".to_string(), json!(temperature));
        }

        if let Some(tools) = &request.options.tools {
            obj.insert("tools".to_string(), serde_json::to_value(tools)?);
        }

        if request.options.json_mode {
            obj.insert(
                "response_format".to_string(),
                json!({"type": "json_object"}),
            );
        }

        Ok(payload)
    }
}

#[async_trait]
impl ProviderClient for OpenAIClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = Self::build_payload(&request)?;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %request.model, url = %url, "starting chat stream");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI API error ({}): {}", status, body);
        }

        Ok(parse_chat_sse_stream(response))
    }
}
