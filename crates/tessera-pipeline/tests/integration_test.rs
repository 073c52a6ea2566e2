use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tessera_decoder::StreamEvent;
use tessera_llm::{ChatRequest, EventStream, Message, ProviderClient, ProviderEvent, ToolSpec};
use tessera_pipeline::{prompts::TOOL_ACK, DecodePipeline};
use tessera_tools::{Tool, ToolRegistry};
use tokio::sync::mpsc;

enum ScriptEvent {
    Event(ProviderEvent),
    Fail(&'static str),
}

/// Provider that replays one pre-recorded stream per `stream_chat` call
/// and records the requests it was given.
struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<ScriptEvent>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(scripts: Vec<Vec<ScriptEvent>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response left"))?;
        let items: Vec<Result<ProviderEvent>> = script
            .into_iter()
            .map(|event| match event {
                ScriptEvent::Event(event) => Ok(event),
                ScriptEvent::Fail(message) => Err(anyhow!(message)),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

fn delta(text: &str) -> ScriptEvent {
    ScriptEvent::Event(ProviderEvent::TextDelta { text: text.into() })
}

fn tool_call(name: &str, arguments: Value) -> ScriptEvent {
    ScriptEvent::Event(ProviderEvent::ToolCall {
        name: name.into(),
        arguments,
    })
}

fn finish() -> ScriptEvent {
    ScriptEvent::Event(ProviderEvent::Finish { reason: None })
}

async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut out = Vec::new();
    while let Some(event) = rx.recv().await {
        out.push(event);
    }
    out
}

fn reasoning_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Reasoning { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

fn answer_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Text { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

fn count_reasoning_complete(events: &[StreamEvent]) -> usize {
    events
        .iter()
        .filter(|e| **e == StreamEvent::ReasoningComplete)
        .count()
}

struct CannedSearchTool {
    output: Result<&'static str, &'static str>,
}

#[async_trait]
impl Tool for CannedSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search",
            "Search the web.",
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        )
    }

    async fn call(&self, _arguments: &Value) -> Result<String> {
        match self.output {
            Ok(output) => Ok(output.to_string()),
            Err(message) => Err(anyhow!(message)),
        }
    }
}

#[tokio::test]
async fn plain_answer_streams_text_then_done() {
    let provider = ScriptedProvider::new(vec![vec![delta("4"), finish()]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_ask(vec![Message::user("2+2?")])).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Text { content: "4".into() },
            StreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn tagged_reasoning_splits_into_phases() {
    let provider = ScriptedProvider::new(vec![vec![
        delta("<think>plan"),
        delta(" it</think>"),
        delta("Answer."),
        finish(),
    ]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_ask(vec![Message::user("q")])).await;

    assert_eq!(reasoning_text(&events), "plan it");
    assert_eq!(answer_text(&events), "Answer.");
    assert_eq!(count_reasoning_complete(&events), 1);
    assert_eq!(events.last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn ask_prepends_a_system_prompt_and_advertises_tools() {
    let provider = ScriptedProvider::new(vec![vec![delta("ok"), finish()]]);
    let registry = ToolRegistry::new().register(Box::new(CannedSearchTool { output: Ok("42") }));
    let pipeline =
        DecodePipeline::new(Arc::clone(&provider) as Arc<dyn ProviderClient>, "test-model")
            .with_tools(Arc::new(registry));

    collect(pipeline.spawn_ask(vec![Message::user("q")])).await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].role(), "system");
    assert_eq!(requests[0].messages[1], Message::user("q"));
    let tools = requests[0].options.tools.as_ref().unwrap();
    assert_eq!(tools[0].function.name, "search");
}

#[tokio::test]
async fn tool_call_runs_a_continuation_pass() {
    let provider = ScriptedProvider::new(vec![
        vec![
            delta("<think>Searching now. "),
            tool_call("search", json!({"query": "answer"})),
            finish(),
        ],
        vec![delta("Found it.</think>"), delta("The answer is 42."), finish()],
    ]);
    let registry = ToolRegistry::new().register(Box::new(CannedSearchTool { output: Ok("42") }));
    let pipeline =
        DecodePipeline::new(Arc::clone(&provider) as Arc<dyn ProviderClient>, "test-model")
            .with_tools(Arc::new(registry));

    let events = collect(pipeline.spawn_ask(vec![Message::user("what is the answer?")])).await;

    let reasoning = reasoning_text(&events);
    assert!(reasoning.contains("Searching now. "));
    assert!(reasoning.contains("Using `search` tool..."));
    assert!(reasoning.contains("Retrieved: 42"));
    assert!(reasoning.contains("Found it."));
    assert_eq!(answer_text(&events), "The answer is 42.");
    assert_eq!(count_reasoning_complete(&events), 1);
    assert_eq!(events.last(), Some(&StreamEvent::Done));

    // The second request carries the acknowledgment and the tool outputs,
    // but never the tool definitions.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let continuation = &requests[1];
    assert!(continuation.options.tools.is_none());
    assert!(continuation
        .messages
        .iter()
        .any(|m| m.role() == "assistant" && m.content() == TOOL_ACK));
    assert!(continuation
        .messages
        .last()
        .unwrap()
        .content()
        .contains("[search]\n42"));
}

#[tokio::test]
async fn reasoning_spanning_the_tool_boundary_closes_once() {
    let provider = ScriptedProvider::new(vec![
        vec![
            delta("<think>part one "),
            tool_call("search", json!({"query": "x"})),
            finish(),
        ],
        vec![delta("part two</think>done"), finish()],
    ]);
    let registry = ToolRegistry::new().register(Box::new(CannedSearchTool { output: Ok("ok") }));
    let pipeline =
        DecodePipeline::new(provider as Arc<dyn ProviderClient>, "test-model")
            .with_tools(Arc::new(registry));

    let events = collect(pipeline.spawn_ask(vec![Message::user("q")])).await;

    let reasoning = reasoning_text(&events);
    assert!(reasoning.starts_with("part one "));
    assert!(reasoning.ends_with("part two"));
    assert_eq!(answer_text(&events), "done");
    assert_eq!(count_reasoning_complete(&events), 1);
}

#[tokio::test]
async fn tool_failure_is_reported_as_a_result() {
    let provider = ScriptedProvider::new(vec![
        vec![tool_call("search", json!({"query": "x"})), finish()],
        vec![delta("</think>Could not search."), finish()],
    ]);
    let registry =
        ToolRegistry::new().register(Box::new(CannedSearchTool { output: Err("boom") }));
    let pipeline = DecodePipeline::new(provider as Arc<dyn ProviderClient>, "test-model")
        .with_tools(Arc::new(registry));

    let events = collect(pipeline.spawn_ask(vec![Message::user("q")])).await;

    assert!(reasoning_text(&events).contains("Retrieved: Tool execution failed: boom"));
    assert_eq!(answer_text(&events), "Could not search.");
    assert_eq!(events.last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn upstream_failure_flushes_buffered_text_before_the_error() {
    let provider = ScriptedProvider::new(vec![vec![
        delta("partial <thi"),
        ScriptEvent::Fail("connection reset"),
    ]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_ask(vec![Message::user("q")])).await;

    // "partial " is emitted eagerly; the held-back "<thi" flushes on error.
    assert_eq!(answer_text(&events), "partial <thi");
    match events.last() {
        Some(StreamEvent::Error { message }) => assert!(message.contains("connection reset")),
        other => panic!("expected a trailing error event, got {:?}", other),
    }
    assert!(!events.contains(&StreamEvent::Done));
}

#[tokio::test]
async fn agent_mode_streams_snapshots_then_done() {
    let provider = ScriptedProvider::new(vec![vec![
        delta(r#"{"version": 1, "children": [{"type": "te"#),
        delta(r#"xt", "text": "Hel"#),
        delta(r#"lo"}]}"#),
        finish(),
    ]]);
    let pipeline = DecodePipeline::new(
        Arc::clone(&provider) as Arc<dyn ProviderClient>,
        "test-model",
    );

    let events = collect(pipeline.spawn_agent(vec![Message::user("greet me")])).await;

    assert_eq!(events.last(), Some(&StreamEvent::Done));
    let snapshots: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Snapshot { document } => Some(document),
            _ => None,
        })
        .collect();
    assert!(!snapshots.is_empty());

    // Snapshots supersede each other; the last one is the full document.
    let last = serde_json::to_value(snapshots.last().unwrap()).unwrap();
    assert_eq!(last["children"][0]["type"], "text");
    assert_eq!(last["children"][0]["text"], "Hello");

    // Agent mode asks for JSON output and a wide context window.
    let request = &provider.requests()[0];
    assert!(request.options.json_mode);
    assert_eq!(request.options.num_ctx, Some(32000));
}

#[tokio::test]
async fn agent_mode_rejects_an_incomplete_final_document() {
    let provider = ScriptedProvider::new(vec![vec![
        delta(r#"{"version": 1, "children": ["#),
        finish(),
    ]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_agent(vec![Message::user("q")])).await;

    match events.last() {
        Some(StreamEvent::Error { message }) => {
            assert!(message.contains("not a complete JSON document"));
        }
        other => panic!("expected a trailing error event, got {:?}", other),
    }
}

#[tokio::test]
async fn agent_mode_rejects_a_schema_violation() {
    let provider = ScriptedProvider::new(vec![vec![
        delta(r#"{"version": 1, "children": [{"type": "carousel"}]}"#),
        finish(),
    ]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_agent(vec![Message::user("q")])).await;

    match events.last() {
        Some(StreamEvent::Error { message }) => {
            assert!(message.contains("violates the schema"));
        }
        other => panic!("expected a trailing error event, got {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_snapshots_are_suppressed() {
    // Whitespace-only growth parses to the same document; no new snapshot.
    let provider = ScriptedProvider::new(vec![vec![
        delta(r#"{"version": 1, "children": []"#),
        delta("  "),
        delta("}"),
        finish(),
    ]]);
    let pipeline = DecodePipeline::new(provider, "test-model");

    let events = collect(pipeline.spawn_agent(vec![Message::user("q")])).await;

    let snapshot_count = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Snapshot { .. }))
        .count();
    assert_eq!(snapshot_count, 1);
    assert_eq!(events.last(), Some(&StreamEvent::Done));
}
