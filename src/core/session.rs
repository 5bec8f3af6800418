//! Per-session chat orchestration: submitting turns, streaming the reply into
//! the transcript, cancellation and follow-up suggestions.
//!
//! A [`ChatSession`] is owned by one UI task and only mutated through
//! `&mut self`. Network work runs on spawned tasks that report back through
//! [`SessionUpdate`]s tagged with the id of the operation that produced them;
//! the owner feeds those to [`ChatSession::apply`], which drops anything from
//! a superseded operation.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{InputItem, ResponsesRequest};
use crate::core::chat_stream::{ResponseEvent, ResponsesApi};
use crate::core::conversation::Conversation;
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::suggestions::{build_suggestion_request, parse_suggestions};
use crate::mcp::registration::McpToolRegistration;

/// Process-wide collaborators, built once from configuration and shared
/// read-only by every session.
pub struct ChatServices {
    api: Arc<dyn ResponsesApi>,
    model: String,
    tool: McpToolRegistration,
    system_prompt: String,
}

impl ChatServices {
    pub fn new(
        api: Arc<dyn ResponsesApi>,
        model: impl Into<String>,
        tool: McpToolRegistration,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            api,
            model: model.into(),
            tool,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tool(&self) -> &McpToolRegistration {
        &self.tool
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn response_request(&self, items: &[InputItem]) -> ResponsesRequest {
        ResponsesRequest {
            model: self.model.clone(),
            input: items.to_vec(),
            tools: vec![self.tool.tool_definition()],
            stream: true,
        }
    }
}

/// Results reported by background tasks.
#[derive(Debug)]
pub enum SessionUpdate {
    ResponseDelta { stream_id: u64, delta: String },
    ResponseCompleted { stream_id: u64 },
    ResponseFailed { stream_id: u64, error: ChatError },
    SuggestionsReady { request_id: u64, suggestions: Vec<String> },
    SuggestionsFailed { request_id: u64, error: ChatError },
}

/// What the UI should react to after applying an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The in-flight reply grew by `delta`.
    ResponseUpdated { delta: String },
    /// The reply was finalised and appended to the transcript.
    ResponseCompleted,
    /// The suggestion set was replaced.
    SuggestionsUpdated,
    Error(ChatError),
}

/// Cancel-then-replace bookkeeping for one kind of operation.
#[derive(Debug, Default)]
struct OperationSlot {
    token: Option<CancellationToken>,
    current_id: u64,
}

impl OperationSlot {
    fn start(&mut self) -> (CancellationToken, u64) {
        self.cancel();
        self.current_id += 1;
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        (token, self.current_id)
    }

    fn cancel(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.token.is_some() && id == self.current_id
    }

    /// Retire the operation if `id` is still the live one.
    fn finish(&mut self, id: u64) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.token = None;
        true
    }

    fn is_active(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug)]
struct InFlightResponse {
    message: Message,
    accumulated: String,
}

impl InFlightResponse {
    fn new() -> Self {
        Self {
            message: Message::assistant(""),
            accumulated: String::new(),
        }
    }
}

pub struct ChatSession {
    services: Arc<ChatServices>,
    conversation: Conversation,
    in_flight: Option<InFlightResponse>,
    suggestions: Vec<String>,
    response: OperationSlot,
    suggestion_fetch: OperationSlot,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl ChatSession {
    pub fn new(services: Arc<ChatServices>) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let conversation = Conversation::new(services.system_prompt());
        let session = Self {
            services,
            conversation,
            in_flight: None,
            suggestions: Vec::new(),
            response: OperationSlot::default(),
            suggestion_fetch: OperationSlot::default(),
            updates,
        };
        (session, rx)
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// The assistant message currently being streamed, if any.
    pub fn in_flight_message(&self) -> Option<&Message> {
        self.in_flight.as_ref().map(|in_flight| &in_flight.message)
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_responding(&self) -> bool {
        self.response.is_active()
    }

    pub fn is_fetching_suggestions(&self) -> bool {
        self.suggestion_fetch.is_active()
    }

    /// Start a new turn. Any reply still streaming is cancelled first and its
    /// partial text kept in the transcript. Blank input is ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_user_message(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.commit_in_flight_response();
        self.clear_suggestions();
        self.conversation.push(Message::user(text));

        let (token, stream_id) = self.response.start();
        self.in_flight = Some(InFlightResponse::new());
        let request = self.services.response_request(self.conversation.items());
        debug!(stream_id, items = request.input.len(), "starting response stream");
        spawn_response_stream(
            Arc::clone(&self.services.api),
            request,
            token,
            stream_id,
            self.updates.clone(),
        );
        true
    }

    pub fn select_suggestion(&mut self, suggestion: &str) -> bool {
        self.submit_user_message(suggestion)
    }

    /// Stop the reply in progress, keeping whatever text already arrived.
    pub fn cancel_response(&mut self) -> bool {
        let was_streaming = self.in_flight.is_some();
        self.commit_in_flight_response();
        was_streaming
    }

    /// Back to just the system prompt, with nothing in flight.
    pub fn reset(&mut self) {
        self.response.cancel();
        self.in_flight = None;
        self.clear_suggestions();
        self.conversation.reset();
    }

    /// Cancel all background work; the session should not be used afterwards.
    pub fn dispose(&mut self) {
        self.commit_in_flight_response();
        self.suggestion_fetch.cancel();
    }

    pub fn apply(&mut self, update: SessionUpdate) -> Option<SessionEvent> {
        match update {
            SessionUpdate::ResponseDelta { stream_id, delta } => {
                if !self.response.is_current(stream_id) || delta.is_empty() {
                    return None;
                }
                let in_flight = self.in_flight.as_mut()?;
                in_flight.accumulated.push_str(&delta);
                in_flight.message.push_segment(delta.clone());
                Some(SessionEvent::ResponseUpdated { delta })
            }
            SessionUpdate::ResponseCompleted { stream_id } => {
                if !self.response.finish(stream_id) {
                    return None;
                }
                let InFlightResponse {
                    mut message,
                    accumulated,
                } = self.in_flight.take()?;
                message.set_text(accumulated);
                self.conversation.push(message);
                self.start_suggestion_fetch();
                Some(SessionEvent::ResponseCompleted)
            }
            SessionUpdate::ResponseFailed { stream_id, error } => {
                if !self.response.finish(stream_id) {
                    return None;
                }
                self.keep_partial_response();
                Some(SessionEvent::Error(error))
            }
            SessionUpdate::SuggestionsReady {
                request_id,
                suggestions,
            } => {
                if !self.suggestion_fetch.finish(request_id) {
                    return None;
                }
                self.suggestions = suggestions;
                Some(SessionEvent::SuggestionsUpdated)
            }
            SessionUpdate::SuggestionsFailed { request_id, error } => {
                if !self.suggestion_fetch.finish(request_id) {
                    return None;
                }
                self.suggestions.clear();
                Some(SessionEvent::Error(error))
            }
        }
    }

    fn commit_in_flight_response(&mut self) {
        if self.response.cancel() {
            debug!(stream_id = self.response.current_id, "response stream cancelled");
        }
        self.keep_partial_response();
    }

    /// Every user message gets a reply, even an empty one, so the transcript
    /// keeps alternating.
    fn keep_partial_response(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            self.conversation.push(in_flight.message);
        }
    }

    fn clear_suggestions(&mut self) {
        self.suggestion_fetch.cancel();
        self.suggestions.clear();
    }

    fn start_suggestion_fetch(&mut self) {
        if !self.conversation.has_dialogue() {
            return;
        }
        let (token, request_id) = self.suggestion_fetch.start();
        let request = build_suggestion_request(self.services.model(), self.conversation.messages());
        spawn_suggestion_fetch(
            Arc::clone(&self.services.api),
            request,
            token,
            request_id,
            self.updates.clone(),
        );
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.response.cancel();
        self.suggestion_fetch.cancel();
    }
}

fn spawn_response_stream(
    api: Arc<dyn ResponsesApi>,
    request: ResponsesRequest,
    token: CancellationToken,
    stream_id: u64,
    tx: mpsc::UnboundedSender<SessionUpdate>,
) {
    tokio::spawn(async move {
        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            opened = api.stream_response(request) => match opened {
                Ok(stream) => stream,
                Err(error) => {
                    let _ = tx.send(SessionUpdate::ResponseFailed { stream_id, error });
                    return;
                }
            },
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                next = stream.next() => next,
            };

            let update = match next {
                Some(Ok(ResponseEvent::TextDelta(delta))) => {
                    SessionUpdate::ResponseDelta { stream_id, delta }
                }
                Some(Ok(ResponseEvent::Other(kind))) => {
                    debug!(stream_id, %kind, "ignoring stream event");
                    continue;
                }
                Some(Ok(ResponseEvent::Completed)) | None => {
                    let _ = tx.send(SessionUpdate::ResponseCompleted { stream_id });
                    return;
                }
                Some(Err(error)) => {
                    let _ = tx.send(SessionUpdate::ResponseFailed { stream_id, error });
                    return;
                }
            };

            if tx.send(update).is_err() {
                return;
            }
        }
    });
}

fn spawn_suggestion_fetch(
    api: Arc<dyn ResponsesApi>,
    request: ResponsesRequest,
    token: CancellationToken,
    request_id: u64,
    tx: mpsc::UnboundedSender<SessionUpdate>,
) {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = api.create_response(request) => result,
        };

        let update = match result {
            Ok(text) => SessionUpdate::SuggestionsReady {
                request_id,
                suggestions: parse_suggestions(&text),
            },
            Err(error) => SessionUpdate::SuggestionsFailed { request_id, error },
        };
        let _ = tx.send(update);
    });
}
