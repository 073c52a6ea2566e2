//! High-level builder API for assembling decode pipelines

use std::sync::Arc;

use anyhow::Result;
use tessera_llm::{OllamaClient, OpenAIClient, ProviderClient};
use tessera_pipeline::DecodePipeline;
use tessera_tools::{
    GithubClient, GithubReleaseTool, SearchImageTool, SearchTool, SerperClient, ToolRegistry,
};

enum Provider {
    OpenAI { api_key: String },
    Ollama,
}

/// Builds a [`DecodePipeline`] against one provider.
///
/// # Example
///
/// ```rust,no_run
/// use tessera::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pipeline = PipelineBuilder::ollama()
///     .model("llama3.2")
///     .serper_key("serper-key")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct PipelineBuilder {
    provider: Provider,
    base_url: Option<String>,
    model: String,
    serper_key: Option<String>,
    github_tool: bool,
}

impl PipelineBuilder {
    /// Target the OpenAI chat completions API
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider: Provider::OpenAI {
                api_key: api_key.into(),
            },
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            serper_key: None,
            github_tool: true,
        }
    }

    /// Target a local or remote Ollama server
    pub fn ollama() -> Self {
        Self {
            provider: Provider::Ollama,
            base_url: None,
            model: "llama3.2".to_string(),
            serper_key: None,
            github_tool: true,
        }
    }

    /// Override the provider base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model name (defaults: gpt-4o-mini for OpenAI, llama3.2 for Ollama)
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Enable the web search and image search tools with a Serper API key
    pub fn serper_key(mut self, key: impl Into<String>) -> Self {
        self.serper_key = Some(key.into());
        self
    }

    /// Disable the GitHub latest-release tool (enabled by default)
    pub fn without_github_tool(mut self) -> Self {
        self.github_tool = false;
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be constructed, for example
    /// when the OpenAI API key contains non-header characters.
    pub fn build(self) -> Result<DecodePipeline> {
        let provider: Arc<dyn ProviderClient> = match self.provider {
            Provider::OpenAI { api_key } => {
                let mut client = OpenAIClient::new(&api_key)?;
                if let Some(base_url) = &self.base_url {
                    client = client.with_base_url(base_url);
                }
                Arc::new(client)
            }
            Provider::Ollama => {
                let mut client = OllamaClient::new()?;
                if let Some(base_url) = &self.base_url {
                    client = client.with_base_url(base_url);
                }
                Arc::new(client)
            }
        };

        let mut registry = ToolRegistry::new();
        if let Some(key) = &self.serper_key {
            let serper = Arc::new(SerperClient::new(key)?);
            registry = registry
                .register(Box::new(SearchTool::new(Arc::clone(&serper))))
                .register(Box::new(SearchImageTool::new(serper)));
        }
        if self.github_tool {
            registry = registry.register(Box::new(GithubReleaseTool::new(Arc::new(
                GithubClient::new()?,
            ))));
        }

        Ok(DecodePipeline::new(provider, self.model).with_tools(Arc::new(registry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_builder_constructs_a_pipeline() {
        let pipeline = PipelineBuilder::openai("sk-test")
            .model("gpt-4o")
            .serper_key("serper-test")
            .build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn ollama_builder_needs_no_key() {
        let pipeline = PipelineBuilder::ollama()
            .base_url("http://remote:11434")
            .without_github_tool()
            .build();
        assert!(pipeline.is_ok());
    }
}
