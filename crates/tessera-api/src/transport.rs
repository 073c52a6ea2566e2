use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use futures::StreamExt;
use tessera_decoder::StreamEvent;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Frame one decode event for the SSE wire.
///
/// Snapshots are sent as the bare document JSON so clients can render
/// them without unwrapping an envelope, and `Done` becomes the literal
/// `[DONE]` terminator. Everything else goes out as its tagged JSON form.
pub fn frame(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Snapshot { document } => match serde_json::to_string(document) {
            Ok(json) => format!("data: {}\n\n", json),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize document snapshot");
                error_frame("Failed to serialize document")
            }
        },
        StreamEvent::Done => "data: [DONE]\n\n".to_string(),
        other => match serde_json::to_string(other) {
            Ok(json) => format!("data: {}\n\n", json),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize stream event");
                error_frame("Failed to serialize event")
            }
        },
    }
}

fn error_frame(message: &str) -> String {
    format!("data: {{\"type\":\"error\",\"message\":\"{}\"}}\n\n", message)
}

/// Wrap a pipeline event receiver in a streaming SSE response.
///
/// When the client disconnects the body stream is dropped, which drops
/// the receiver; the pipeline's next send fails and its task winds down.
pub fn sse_response(rx: mpsc::Receiver<StreamEvent>) -> Response {
    let stream = ReceiverStream::new(rx)
        .map(|event| Ok::<_, std::convert::Infallible>(frame(&event).into_bytes()));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    // Tell nginx-style proxies not to buffer the stream.
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_schema::materialize_strict;

    #[test]
    fn tagged_events_are_framed_as_json() {
        let framed = frame(&StreamEvent::Reasoning {
            content: "checking".into(),
        });
        assert_eq!(
            framed,
            "data: {\"type\":\"reasoning\",\"content\":\"checking\"}\n\n"
        );

        let framed = frame(&StreamEvent::ReasoningComplete);
        assert_eq!(framed, "data: {\"type\":\"reasoning_complete\"}\n\n");
    }

    #[test]
    fn snapshots_are_framed_without_an_envelope() {
        let document = materialize_strict(&json!({
            "version": 1,
            "children": [{"type": "text", "text": "hi"}]
        }))
        .unwrap();
        let framed = frame(&StreamEvent::Snapshot { document });

        assert!(framed.starts_with("data: {"));
        assert!(framed.ends_with("\n\n"));
        let payload = framed
            .strip_prefix("data: ")
            .and_then(|s| s.strip_suffix("\n\n"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value.get("type").is_none());
    }

    #[test]
    fn done_becomes_the_terminator_literal() {
        assert_eq!(frame(&StreamEvent::Done), "data: [DONE]\n\n");
    }

    #[test]
    fn error_events_carry_the_message() {
        let framed = frame(&StreamEvent::Error {
            message: "upstream closed".into(),
        });
        assert_eq!(
            framed,
            "data: {\"type\":\"error\",\"message\":\"upstream closed\"}\n\n"
        );
    }

    #[tokio::test]
    async fn response_carries_streaming_headers() {
        let (_tx, rx) = mpsc::channel(1);
        let response = sse_response(rx);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");
    }
}
