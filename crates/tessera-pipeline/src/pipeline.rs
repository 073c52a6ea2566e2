use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::StreamExt;
use tessera_decoder::{PhaseClassifier, StreamEvent, TagScanner};
use tessera_llm::{ChatOptions, ChatRequest, Message, ProviderClient, ProviderEvent};
use tessera_schema::{materialize_partial, materialize_strict, parse_partial_json, Document};
use tessera_tools::ToolRegistry;
use tokio::sync::mpsc;

use crate::interceptor::{ToolActivity, ToolInterceptor};
use crate::prompts;

const CHANNEL_CAPACITY: usize = 1000;
const AGENT_NUM_CTX: u32 = 32000;
const DEFAULT_TEMPERATURE: f32 = 1.0;

/// One decode pipeline per request. Ask mode streams reasoning and text
/// events through the tag scanner; agent mode streams schema-valid document
/// snapshots.
pub struct DecodePipeline {
    provider: Arc<dyn ProviderClient>,
    model: String,
    tools: Arc<ToolRegistry>,
}

impl DecodePipeline {
    pub fn new(provider: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            tools: Arc::new(ToolRegistry::new()),
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Spawn an ask-mode run in the background, return the event receiver.
    pub fn spawn_ask(&self, messages: Vec<Message>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let model = self.model.clone();
        let tools = Arc::clone(&self.tools);

        tokio::spawn(async move {
            if let Err(e) = run_ask(provider, model, tools, messages, tx.clone()).await {
                tracing::warn!(error = %e, "ask pipeline failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        });

        rx
    }

    /// Spawn an agent-mode run in the background, return the event receiver.
    pub fn spawn_agent(&self, messages: Vec<Message>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let model = self.model.clone();

        tokio::spawn(async move {
            if let Err(e) = run_agent(provider, model, messages, tx.clone()).await {
                tracing::warn!(error = %e, "agent pipeline failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        });

        rx
    }
}

async fn run_ask(
    provider: Arc<dyn ProviderClient>,
    model: String,
    tools: Arc<ToolRegistry>,
    messages: Vec<Message>,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let mut request_messages = Vec::with_capacity(messages.len() + 1);
    request_messages.push(Message::system(prompts::ask_system_prompt(Utc::now())));
    request_messages.extend(messages.iter().cloned());

    let mut options = ChatOptions::new().temperature(DEFAULT_TEMPERATURE);
    if !tools.is_empty() {
        options = options.tools(tools.specs());
    }
    let request = ChatRequest::new(model.clone(), request_messages).with_options(options);

    let mut stream = provider.stream_chat(request).await?;
    let mut scanner = TagScanner::new();
    let mut classifier = PhaseClassifier::new();
    let mut interceptor = ToolInterceptor::new();

    while let Some(event) = stream.next().await {
        match event {
            Ok(ProviderEvent::TextDelta { text }) => {
                send_all(&tx, classifier.classify(scanner.push(&text))).await?;
            }
            Ok(ProviderEvent::ToolCall { name, arguments }) => {
                // Flush buffered reasoning before announcing the tool.
                send_all(&tx, classifier.classify(scanner.flush_pending())).await?;
                tx.send(interceptor.on_tool_call(&name)).await?;

                let output = match tools.execute(&name, &arguments).await {
                    Ok(output) => output,
                    Err(e) => {
                        tracing::warn!(tool = %name, error = %e, "tool execution failed");
                        format!("Tool execution failed: {}", e)
                    }
                };
                tx.send(interceptor.on_tool_result(name, output)).await?;
            }
            Ok(ProviderEvent::Finish { .. }) => break,
            Err(e) => {
                send_all(&tx, classifier.classify(scanner.finish())).await?;
                return Err(e);
            }
        }
    }

    send_all(&tx, classifier.classify(scanner.finish())).await?;

    if interceptor.has_activity() {
        let marker = scanner.last_marker().unwrap_or("think");
        run_continuation(
            &provider,
            &model,
            &messages,
            interceptor.activities(),
            marker,
            &mut classifier,
            &tx,
        )
        .await?;
    }

    tx.send(StreamEvent::Done).await?;
    Ok(())
}

/// Second pass after tool use. The scanner resumes inside the tag the first
/// pass left open, so reasoning that spans the tool boundary stays a single
/// transcript.
async fn run_continuation(
    provider: &Arc<dyn ProviderClient>,
    model: &str,
    messages: &[Message],
    activities: &[ToolActivity],
    marker: &str,
    classifier: &mut PhaseClassifier,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let request_messages = prompts::continuation_messages(messages, activities, Utc::now());
    let request = ChatRequest::new(model, request_messages)
        .with_options(ChatOptions::new().temperature(DEFAULT_TEMPERATURE));

    let mut stream = provider
        .stream_chat(request)
        .await
        .context("Continuation request failed")?;
    let mut scanner = TagScanner::resume(marker);

    while let Some(event) = stream.next().await {
        match event {
            Ok(ProviderEvent::TextDelta { text }) => {
                send_all(tx, classifier.classify(scanner.push(&text))).await?;
            }
            Ok(ProviderEvent::ToolCall { name, .. }) => {
                tracing::warn!(tool = %name, "ignoring tool call in continuation pass");
            }
            Ok(ProviderEvent::Finish { .. }) => break,
            Err(e) => {
                send_all(tx, classifier.classify(scanner.finish())).await?;
                return Err(e);
            }
        }
    }

    send_all(tx, classifier.classify(scanner.finish())).await?;
    Ok(())
}

async fn run_agent(
    provider: Arc<dyn ProviderClient>,
    model: String,
    messages: Vec<Message>,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let mut request_messages = Vec::with_capacity(messages.len() + 1);
    request_messages.push(Message::system(prompts::agent_system_prompt(Utc::now())));
    request_messages.extend(messages);

    let options = ChatOptions::new()
        .temperature(DEFAULT_TEMPERATURE)
        .json_mode()
        .num_ctx(AGENT_NUM_CTX);
    let request = ChatRequest::new(model, request_messages).with_options(options);

    let mut stream = provider.stream_chat(request).await?;
    let mut buffer = String::new();
    let mut last_snapshot: Option<Document> = None;

    while let Some(event) = stream.next().await {
        match event {
            Ok(ProviderEvent::TextDelta { text }) => {
                buffer.push_str(&text);
                if let Some(value) = parse_partial_json(&buffer) {
                    match materialize_partial(&value) {
                        Ok(Some(document)) => {
                            if last_snapshot.as_ref() != Some(&document) {
                                tx.send(StreamEvent::Snapshot {
                                    document: document.clone(),
                                })
                                .await?;
                                last_snapshot = Some(document);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            return Err(e).context("Streamed document violates the schema");
                        }
                    }
                }
            }
            Ok(ProviderEvent::ToolCall { name, .. }) => {
                tracing::warn!(tool = %name, "ignoring tool call in agent mode");
            }
            Ok(ProviderEvent::Finish { .. }) => break,
            Err(e) => return Err(e),
        }
    }

    let value: serde_json::Value = serde_json::from_str(buffer.trim())
        .context("Model output is not a complete JSON document")?;
    let document = materialize_strict(&value).context("Final document violates the schema")?;

    if last_snapshot.as_ref() != Some(&document) {
        tx.send(StreamEvent::Snapshot { document }).await?;
    }
    tx.send(StreamEvent::Done).await?;
    Ok(())
}

async fn send_all(tx: &mpsc::Sender<StreamEvent>, events: Vec<StreamEvent>) -> Result<()> {
    for event in events {
        tx.send(event).await?;
    }
    Ok(())
}
