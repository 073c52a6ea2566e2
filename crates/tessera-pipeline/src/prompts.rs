use chrono::{DateTime, SecondsFormat, Utc};
use tessera_llm::Message;

use crate::interceptor::ToolActivity;

/// Acknowledgment inserted between the first pass and the continuation.
pub const TOOL_ACK: &str =
    "I have gathered the information I need using my tools and will now answer.";

pub fn ask_system_prompt(now: DateTime<Utc>) -> String {
    format!(
        "You are a helpful assistant. Answer in clear, conversational text \
         without any markup or UI components. When you use tools, rely on \
         their output rather than your training knowledge.\n\n\
         Today's date and time is: {}",
        timestamp(now)
    )
}

pub fn agent_system_prompt(now: DateTime<Utc>) -> String {
    format!(
        "You are an assistant that answers with rich, interactive UI. Your \
         entire output must be a single JSON object with the shape \
         {{\"version\": 1, \"children\": [...]}} where every child is one of \
         the available components.\n\n\
         Available components: Text, Flex, Image, List, Button, Input, \
         Textarea, Select, Chart, Badge, Progress, Alert, Separator, \
         Accordion, Tabs, CodeBlock, Card, Grid, Hero, Stats, Metric, \
         Comparison, Gallery, Timeline, Feature.\n\n\
         Style rules:\n\
         - Start responses conversationally with plain text, never with a \
           title heading.\n\
         - Never use markdown syntax; use Text components with variants \
           instead.\n\
         - Use charts for numeric data and trends, grids of cards for \
           collections, timelines for histories and processes, and forms \
           (Input/Select/Textarea plus a submit Button) when you need user \
           input.\n\
         - Never include image URLs directly; always use searchQuery so \
           images can be fetched dynamically.\n\
         - Add buttons only when there are logical next actions, laid out in \
           a Flex row.\n\n\
         Today's date and time is: {}\n\n\
         Always return valid JSON adhering to the schema. Keep responses \
         natural and conversational. When users interact with buttons or \
         forms, their actions will be sent back as messages.",
        timestamp(now)
    )
}

/// Messages for the second streaming pass: the original conversation, a
/// synthetic acknowledgment, and a system instruction embedding every tool
/// output verbatim.
pub fn continuation_messages(
    messages: &[Message],
    activities: &[ToolActivity],
    now: DateTime<Utc>,
) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len() + 2);
    out.extend(messages.iter().cloned());
    out.push(Message::assistant(TOOL_ACK));
    out.push(Message::system(continuation_instruction(activities, now)));
    out
}

fn continuation_instruction(activities: &[ToolActivity], now: DateTime<Utc>) -> String {
    let mut instruction = String::from(
        "You already called tools for this request. Their outputs are \
         reproduced verbatim below.\n",
    );
    for activity in activities {
        instruction.push_str(&format!(
            "\n[{}]\n{}\n",
            activity.tool_name, activity.output
        ));
    }
    instruction.push_str(&format!(
        "\nToday's date and time is: {}\n\
         Write a concise answer for the user based on these results. When a \
         tool output conflicts with your training knowledge, trust the tool \
         output.",
        timestamp(now)
    ));
    instruction
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}
