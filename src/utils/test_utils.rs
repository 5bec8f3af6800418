use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::ResponsesRequest;
use crate::core::chat_stream::{ResponseEvent, ResponseEventStream, ResponsesApi};
use crate::core::error::ChatError;
use crate::core::session::ChatServices;
use crate::mcp::registration::McpToolRegistration;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

/// A client that never goes through a proxy, so requests reach the local mock.
pub fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build")
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

/// Accept one request, answer it with `body`, and hand back what was sent.
pub async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: &'static str,
) -> (SocketAddr, JoinHandle<Result<CapturedRequest, String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
        let captured = read_http_request(&mut stream).await?;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .await
            .map_err(|err| err.to_string())?;
        stream.shutdown().await.map_err(|err| err.to_string())?;
        Ok(captured)
    });

    (addr, server)
}

/// How a scripted main response behaves.
pub enum ScriptedStream {
    /// Yields the events and ends.
    Events(Vec<Result<ResponseEvent, ChatError>>),
    /// Yields whatever the test pushes through the paired sender.
    Gated(mpsc::UnboundedReceiver<Result<ResponseEvent, ChatError>>),
    /// The request itself fails.
    Fail(ChatError),
}

/// A `ResponsesApi` that replays scripted answers and records every request.
#[derive(Default)]
pub struct ScriptedApi {
    streams: Mutex<VecDeque<ScriptedStream>>,
    completions: Mutex<VecDeque<Result<String, ChatError>>>,
    pub stream_requests: Mutex<Vec<ResponsesRequest>>,
    pub completion_requests: Mutex<Vec<ResponsesRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_deltas(&self, deltas: &[&str]) {
        let mut events: Vec<_> = deltas
            .iter()
            .map(|delta| Ok(ResponseEvent::TextDelta(delta.to_string())))
            .collect();
        events.push(Ok(ResponseEvent::Completed));
        self.push_stream(ScriptedStream::Events(events));
    }

    /// Queue a stream the test feeds by hand.
    pub fn push_gated(&self) -> mpsc::UnboundedSender<Result<ResponseEvent, ChatError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push_stream(ScriptedStream::Gated(rx));
        tx
    }

    pub fn push_stream(&self, stream: ScriptedStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn push_completion(&self, result: Result<String, ChatError>) {
        self.completions.lock().unwrap().push_back(result);
    }

    pub fn stream_request_count(&self) -> usize {
        self.stream_requests.lock().unwrap().len()
    }

    pub fn completion_request_count(&self) -> usize {
        self.completion_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ResponsesApi for ScriptedApi {
    async fn stream_response(
        &self,
        request: ResponsesRequest,
    ) -> Result<ResponseEventStream, ChatError> {
        self.stream_requests.lock().unwrap().push(request);
        let script = self.streams.lock().unwrap().pop_front();
        match script {
            Some(ScriptedStream::Events(events)) => Ok(stream::iter(events).boxed()),
            Some(ScriptedStream::Gated(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Some(ScriptedStream::Fail(err)) => Err(err),
            None => Ok(stream::iter(vec![Ok(ResponseEvent::Completed)]).boxed()),
        }
    }

    async fn create_response(&self, request: ResponsesRequest) -> Result<String, ChatError> {
        self.completion_requests.lock().unwrap().push(request);
        let scripted = self.completions.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(String::new()))
    }
}

pub fn test_registration() -> McpToolRegistration {
    McpToolRegistration::new(
        "todo-list",
        "https://todo.example.com/mcp",
        "test-token",
    )
}

pub fn test_services(api: Arc<ScriptedApi>) -> Arc<ChatServices> {
    Arc::new(ChatServices::new(
        api,
        "test-model",
        test_registration(),
        "You help people manage their to-do list.",
    ))
}
