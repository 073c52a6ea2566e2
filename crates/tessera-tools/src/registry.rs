use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tessera_llm::ToolSpec;

use crate::github::GithubClient;
use crate::serper::SerperClient;

/// A callable tool the model can request by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn call(&self, arguments: &Value) -> Result<String>;
}

/// Name-to-tool dispatch table advertised to providers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Box<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<String> {
        for tool in &self.tools {
            if tool.spec().function.name == name {
                tracing::debug!(tool = name, "executing tool");
                return tool.call(arguments).await;
            }
        }
        bail!("Unknown tool: {}", name)
    }
}

fn require_str<'a>(arguments: &'a Value, field: &str) -> Result<&'a str> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .with_context(|| format!("Tool call missing string argument '{}'", field))
}

/// Web search backed by Serper.
pub struct SearchTool {
    client: Arc<SerperClient>,
}

impl SearchTool {
    pub fn new(client: Arc<SerperClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search",
            "Search the web for information using Google search. Use this when you need current information, facts, or data from the internet.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find information on the web."
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let query = require_str(arguments, "query")?;
        self.client.search(query).await
    }
}

/// Image search backed by Serper.
pub struct SearchImageTool {
    client: Arc<SerperClient>,
}

impl SearchImageTool {
    pub fn new(client: Arc<SerperClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchImageTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search_image",
            "Search for images on the web. Use this when you need to find or display images related to a topic.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find images."
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let query = require_str(arguments, "query")?;
        match self.client.search_image(query).await? {
            Some(url) => Ok(url),
            None => Ok(format!("No image found for query: {}", query)),
        }
    }
}

/// Latest-release lookup against the GitHub REST API.
pub struct GithubReleaseTool {
    client: Arc<GithubClient>,
}

impl GithubReleaseTool {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GithubReleaseTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_latest_release",
            "Look up the latest published release of a GitHub repository, including its tag, date and release notes.",
            json!({
                "type": "object",
                "properties": {
                    "owner": {
                        "type": "string",
                        "description": "Repository owner or organization."
                    },
                    "repo": {
                        "type": "string",
                        "description": "Repository name."
                    }
                },
                "required": ["owner", "repo"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let owner = require_str(arguments, "owner")?;
        let repo = require_str(arguments, "repo")?;
        self.client.latest_release(owner, repo).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(
                "echo",
                "Echo the input back.",
                json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            )
        }

        async fn call(&self, arguments: &Value) -> Result<String> {
            Ok(require_str(arguments, "text")?.to_string())
        }
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let registry = ToolRegistry::new().register(Box::new(EchoTool));
        let result = registry
            .execute("echo", &json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(result, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::new().register(Box::new(EchoTool));
        let err = registry.execute("nope", &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Unknown tool: nope"));
    }

    #[tokio::test]
    async fn missing_argument_is_an_error() {
        let registry = ToolRegistry::new().register(Box::new(EchoTool));
        let err = registry.execute("echo", &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("missing string argument 'text'"));
    }

    #[test]
    fn lists_specs_in_registration_order() {
        let registry = ToolRegistry::new().register(Box::new(EchoTool));
        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].function.name, "echo");
    }
}
