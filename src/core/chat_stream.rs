use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde_json::Value;

use crate::api::{ResponsesRequest, StreamEventPayload};
use crate::core::error::ChatError;
use crate::utils::sse::{sse_data_payload, SseLineBuffer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseEvent {
    /// An incremental fragment of output text.
    TextDelta(String),
    /// Any event the chat loop does not act on (tool activity, bookkeeping).
    Other(String),
    /// The response finished; no further events follow.
    Completed,
}

pub type ResponseEventStream = BoxStream<'static, Result<ResponseEvent, ChatError>>;

/// The model API as seen by a chat session.
#[async_trait]
pub trait ResponsesApi: Send + Sync {
    /// Start a streaming response. Events arrive in order and the stream ends
    /// after `Completed` or the first error.
    async fn stream_response(
        &self,
        request: ResponsesRequest,
    ) -> Result<ResponseEventStream, ChatError>;

    /// Request a complete response and return its output text.
    async fn create_response(&self, request: ResponsesRequest) -> Result<String, ChatError>;
}

/// Interpret one SSE line. `None` means the line carries nothing for us.
pub(crate) fn parse_sse_line(line: &str) -> Option<Result<ResponseEvent, ChatError>> {
    let payload = sse_data_payload(line)?;
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(Ok(ResponseEvent::Completed));
    }

    let event = match serde_json::from_str::<StreamEventPayload>(payload) {
        Ok(event) => event,
        Err(_) => return Some(Err(ChatError::Api(describe_api_error(None, payload)))),
    };

    let parsed = match event.kind.as_str() {
        "response.output_text.delta" => Ok(ResponseEvent::TextDelta(
            event.delta.unwrap_or_default(),
        )),
        "response.completed" => Ok(ResponseEvent::Completed),
        "error" | "response.failed" | "response.incomplete" => {
            Err(ChatError::Api(describe_api_error(None, payload)))
        }
        other => Ok(ResponseEvent::Other(other.to_string())),
    };
    Some(parsed)
}

fn is_terminal(item: &Result<ResponseEvent, ChatError>) -> bool {
    matches!(item, Ok(ResponseEvent::Completed) | Err(_))
}

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    lines: SseLineBuffer,
    pending: VecDeque<String>,
    body_done: bool,
    terminated: bool,
}

/// Turn a streaming HTTP response into a pull-based event stream.
///
/// Nothing is read from the body until the consumer polls, so dropping the
/// stream stops consumption.
pub(crate) fn sse_event_stream(response: reqwest::Response) -> ResponseEventStream {
    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
        .boxed();
    let state = SseState {
        body,
        lines: SseLineBuffer::default(),
        pending: VecDeque::new(),
        body_done: false,
        terminated: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.terminated {
                return None;
            }

            if let Some(line) = state.pending.pop_front() {
                if let Some(item) = parse_sse_line(&line) {
                    state.terminated = is_terminal(&item);
                    return Some((item, state));
                }
                continue;
            }

            if state.body_done {
                // The body ended without a completion event; treat the
                // response as finished with whatever text arrived.
                state.terminated = true;
                return Some((Ok(ResponseEvent::Completed), state));
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.pending.extend(state.lines.push(&chunk)),
                Some(Err(err)) => {
                    state.terminated = true;
                    return Some((Err(ChatError::from(err)), state));
                }
                None => {
                    state.body_done = true;
                    state.pending.extend(state.lines.finish());
                }
            }
        }
    })
    .boxed()
}

/// Plain-text error bodies (proxy pages and the like) are cut to this many
/// characters.
const MAX_PLAIN_ERROR_CHARS: usize = 300;

/// The human-readable part of a responses API error, from either an HTTP
/// error body or a `response.failed` / `response.incomplete` / `error` event.
fn error_summary(value: &Value) -> Option<String> {
    let text = |pointer: &str| value.pointer(pointer).and_then(Value::as_str);

    let summary = text("/response/error/message")
        .map(str::to_owned)
        .or_else(|| {
            text("/response/incomplete_details/reason")
                .map(|reason| format!("response incomplete ({reason})"))
        })
        .or_else(|| text("/error/message").map(str::to_owned))
        .or_else(|| text("/error").map(str::to_owned))
        .or_else(|| text("/message").map(str::to_owned))?;

    let summary = collapse_whitespace(&summary);
    (!summary.is_empty()).then_some(summary)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Describe a failed request or stream for the transcript.
///
/// The first line names the HTTP status when there is one and the error
/// message when one can be found; JSON bodies follow in a fenced block.
pub fn describe_api_error(status: Option<StatusCode>, body: &str) -> String {
    let heading = match status {
        Some(status) => format!("API Error ({status})"),
        None => "API Error".to_string(),
    };

    let body = body.trim();
    if body.is_empty() {
        return heading;
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let plain: String = collapse_whitespace(body)
            .chars()
            .take(MAX_PLAIN_ERROR_CHARS)
            .collect();
        return format!("{heading}: {plain}");
    };

    let detail = serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string());
    match error_summary(&value) {
        Some(summary) => format!("{heading}: {summary}\n```json\n{detail}\n```"),
        None => format!("{heading}\n```json\n{detail}\n```"),
    }
}
