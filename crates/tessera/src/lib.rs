//! # Tessera
//!
//! Tessera turns raw LLM token streams into structured, renderable output:
//!
//! - **Ask mode**: incremental text with `<think>`-style reasoning tags
//!   split into reasoning and answer phases as tokens arrive.
//! - **Agent mode**: schema-validated UI document snapshots decoded from
//!   partial JSON, each snapshot superseding the last.
//! - **Tool use**: web search, image search and GitHub release lookups
//!   surfaced as synthetic reasoning steps, with a continuation pass that
//!   folds tool output back into the answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = PipelineBuilder::openai("sk-...")
//!         .model("gpt-4o-mini")
//!         .build()?;
//!
//!     let mut rx = pipeline.spawn_ask(vec![Message::user("What is 2+2?")]);
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             StreamEvent::Reasoning { content } => eprint!("{}", content),
//!             StreamEvent::Text { content } => print!("{}", content),
//!             StreamEvent::Done => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Tessera consists of several composable crates:
//!
//! - **tessera-schema**: the UI document model and partial-JSON
//!   materializers
//! - **tessera-decoder**: tag scanner and reasoning/text phase classifier
//! - **tessera-llm**: provider clients (OpenAI SSE, Ollama NDJSON)
//! - **tessera-tools**: tool registry, Serper search, GitHub releases
//! - **tessera-pipeline**: the per-request decode pipelines
//!
//! For a complete HTTP service with SSE streaming, see the `tessera-api`
//! binary in the repository.

// Re-export all public APIs
pub use tessera_decoder as decoder;
pub use tessera_llm as llm;
pub use tessera_pipeline as pipeline;
pub use tessera_schema as schema;
pub use tessera_tools as tools;

// Re-export commonly used types
pub use tessera_decoder::{PhaseClassifier, StreamEvent, TagScanner};
pub use tessera_llm::{Message, OllamaClient, OpenAIClient, ProviderClient, ProviderEvent};
pub use tessera_pipeline::DecodePipeline;
pub use tessera_schema::{materialize_partial, materialize_strict, parse_partial_json, Document};
pub use tessera_tools::{SerperClient, Tool, ToolRegistry};

/// High-level builder for assembling decode pipelines
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::PipelineBuilder;
    pub use crate::decoder::StreamEvent;
    pub use crate::llm::Message;
    pub use crate::pipeline::DecodePipeline;
    pub use crate::schema::Document;
    pub use anyhow::Result;
}
