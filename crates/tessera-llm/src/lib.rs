pub mod ollama;
pub mod openai;
pub mod streaming;
pub mod traits;
pub mod types;

pub use traits::{ChatOptions, ChatRequest, EventStream, ProviderClient};

pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use streaming::ProviderEvent;
pub use types::{FunctionSpec, Message, ToolSpec};
