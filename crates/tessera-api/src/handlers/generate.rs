use std::sync::Arc;

use axum::{extract::State, response::Response, Json};
use serde::Deserialize;
use tessera_llm::{Message, OllamaClient, OpenAIClient, ProviderClient};
use tessera_pipeline::DecodePipeline;
use tessera_tools::{
    GithubClient, GithubReleaseTool, SearchImageTool, SearchTool, SerperClient, ToolRegistry,
};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    transport,
};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub mode: Mode,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub serper_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Ask,
    #[default]
    Agent,
}

/// Run one decode pipeline and stream its events back over SSE.
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Response> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".into()));
    }

    let provider_name = req
        .provider
        .as_deref()
        .unwrap_or(&state.config.llm.provider);
    let (provider, model) = build_provider(&state, &req, provider_name)?;

    tracing::info!(provider = provider_name, model = %model, mode = ?req.mode, "starting pipeline");

    let pipeline = DecodePipeline::new(provider, model);
    let rx = match req.mode {
        Mode::Ask => {
            let tools = build_registry(&state, &req)?;
            pipeline.with_tools(Arc::new(tools)).spawn_ask(req.messages)
        }
        Mode::Agent => pipeline.spawn_agent(req.messages),
    };

    Ok(transport::sse_response(rx))
}

fn build_provider(
    state: &AppState,
    req: &GenerateRequest,
    provider_name: &str,
) -> Result<(Arc<dyn ProviderClient>, String), ApiError> {
    match provider_name {
        "openai" => {
            let key = req
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .unwrap_or(&state.config.openai_api_key);
            if key.is_empty() {
                return Err(ApiError::BadRequest(
                    "No OpenAI API key configured. Pass apiKey or set OPENAI_API_KEY.".into(),
                ));
            }
            let mut client = OpenAIClient::new(key)?;
            if let Some(base_url) = req.base_url.as_deref().filter(|u| !u.is_empty()) {
                client = client.with_base_url(base_url);
            }
            let model = resolve_model(state, req, "openai", DEFAULT_OPENAI_MODEL);
            Ok((Arc::new(client), model))
        }
        "ollama" => {
            let base_url = req
                .base_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .unwrap_or(&state.config.llm.ollama_base_url);
            let client = OllamaClient::new()?.with_base_url(base_url);
            let model = resolve_model(state, req, "ollama", DEFAULT_OLLAMA_MODEL);
            Ok((Arc::new(client), model))
        }
        other => Err(ApiError::BadRequest(format!(
            "Unknown provider '{}'. Expected 'openai' or 'ollama'.",
            other
        ))),
    }
}

/// Request model wins; the configured model applies only to the configured
/// provider, otherwise each provider falls back to its own default.
fn resolve_model(
    state: &AppState,
    req: &GenerateRequest,
    provider_name: &str,
    default_model: &str,
) -> String {
    if let Some(model) = req.model.as_deref().filter(|m| !m.is_empty()) {
        return model.to_string();
    }
    if state.config.llm.provider == provider_name {
        return state.config.llm.model.clone();
    }
    default_model.to_string()
}

fn build_registry(state: &AppState, req: &GenerateRequest) -> Result<ToolRegistry, ApiError> {
    let mut registry = ToolRegistry::new();

    let serper_key = req
        .serper_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .unwrap_or(&state.config.serper_api_key);
    if !serper_key.is_empty() {
        let serper = Arc::new(SerperClient::new(serper_key)?);
        registry = registry
            .register(Box::new(SearchTool::new(Arc::clone(&serper))))
            .register(Box::new(SearchImageTool::new(serper)));
    } else {
        tracing::debug!("no Serper API key, web search tools disabled");
    }

    let github = Arc::new(GithubClient::new()?);
    registry = registry.register(Box::new(GithubReleaseTool::new(github)));

    Ok(registry)
}
