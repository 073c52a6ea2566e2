use serde::{Deserialize, Serialize};
use tessera_schema::Document;

/// Events produced by a decode pipeline, in emission order.
///
/// `Reasoning`, `ReasoningComplete`, `Text` and `Error` are serialized as
/// tagged JSON objects on the wire. `Snapshot` and `Done` are framed
/// specially by the transport: a snapshot goes out as the raw document
/// JSON with no envelope, and `Done` becomes the literal `[DONE]`
/// terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Reasoning narrative delta.
    Reasoning { content: String },
    /// The reasoning phase ended; emitted at most once per stream.
    ReasoningComplete,
    /// Final answer delta.
    Text { content: String },
    /// Full document snapshot superseding any previous snapshot.
    Snapshot { document: Document },
    /// Fatal stream error; no further events follow.
    Error { message: String },
    /// Clean end of stream.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_snake_case_type_tags() {
        let event = StreamEvent::Reasoning {
            content: "checking sources".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "reasoning");
        assert_eq!(value["content"], "checking sources");

        let value = serde_json::to_value(&StreamEvent::ReasoningComplete).unwrap();
        assert_eq!(value["type"], "reasoning_complete");

        let value = serde_json::to_value(&StreamEvent::Error {
            message: "upstream closed".into(),
        })
        .unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "upstream closed");
    }
}
