use tessera_decoder::StreamEvent;

const PREVIEW_LIMIT: usize = 200;

/// One executed tool call and its full output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolActivity {
    pub tool_name: String,
    pub output: String,
}

/// Turns tool traffic into synthetic reasoning events and records the
/// outputs for the continuation pass. Scoped to a single pipeline run.
#[derive(Debug, Default)]
pub struct ToolInterceptor {
    activities: Vec<ToolActivity>,
}

impl ToolInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tool_call(&self, name: &str) -> StreamEvent {
        StreamEvent::Reasoning {
            content: format!("Using `{}` tool...", name),
        }
    }

    pub fn on_tool_result(&mut self, name: String, output: String) -> StreamEvent {
        let event = StreamEvent::Reasoning {
            content: format!("Retrieved: {}", preview(&output)),
        };
        self.activities.push(ToolActivity {
            tool_name: name,
            output,
        });
        event
    }

    pub fn has_activity(&self) -> bool {
        !self.activities.is_empty()
    }

    pub fn activities(&self) -> &[ToolActivity] {
        &self.activities
    }
}

fn preview(output: &str) -> String {
    if output.chars().count() <= PREVIEW_LIMIT {
        return output.to_string();
    }
    let cut: String = output.chars().take(PREVIEW_LIMIT).collect();
    format!("{}...", cut)
}
