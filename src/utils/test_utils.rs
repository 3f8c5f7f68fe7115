//! Shared fixtures: a scripted [`ChatBackend`], a ready-made [`App`], and a
//! one-shot HTTP server.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{ChatTextRequest, Credentials, PollReply};
use crate::app::App;
use crate::core::backend::{AccountAction, BackendError, ChatBackend, ChatEndpoint};
use crate::core::controller::{ControllerOptions, SessionController};
use crate::utils::logging::LoggingState;
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FetchReply(String),
    PostText {
        user_id: String,
        endpoint: ChatEndpoint,
        request: ChatTextRequest,
    },
    ClearHistory(String),
    Account {
        action: AccountAction,
        user_id: String,
    },
    Download {
        user_id: String,
        file: String,
    },
}

#[derive(Default)]
struct ScriptState {
    replies: VecDeque<Result<PollReply, StatusCode>>,
    calls: Vec<RecordedCall>,
    fail_posts: bool,
    fail_clear: bool,
    fail_account: bool,
    hang_polls: bool,
    file_bytes: Vec<u8>,
}

/// Backend double that replays queued poll replies and records every call.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

fn server_error(status: StatusCode) -> BackendError {
    BackendError::Status {
        status,
        body: String::new(),
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, reply: PollReply) {
        self.state.lock().unwrap().replies.push_back(Ok(reply));
    }

    pub fn queue_poll_failure(&self) {
        self.state
            .lock()
            .unwrap()
            .replies
            .push_back(Err(StatusCode::BAD_GATEWAY));
    }

    /// Polls never complete until the caller gives up on them.
    pub fn hang_polls(&self, hang: bool) {
        self.state.lock().unwrap().hang_polls = hang;
    }

    pub fn fail_posts(&self, fail: bool) {
        self.state.lock().unwrap().fail_posts = fail;
    }

    pub fn fail_clear(&self, fail: bool) {
        self.state.lock().unwrap().fail_clear = fail;
    }

    pub fn fail_account(&self, fail: bool) {
        self.state.lock().unwrap().fail_account = fail;
    }

    pub fn set_file_bytes(&self, bytes: &[u8]) {
        self.state.lock().unwrap().file_bytes = bytes.to_vec();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than polls, which tick too often to assert on exactly.
    pub fn non_poll_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, RecordedCall::FetchReply(_)))
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn fetch_reply(&self, user_id: &str) -> Result<PollReply, BackendError> {
        self.record(RecordedCall::FetchReply(user_id.to_string()));
        let hang = self.state.lock().unwrap().hang_polls;
        if hang {
            std::future::pending::<()>().await;
        }
        match self.state.lock().unwrap().replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => Err(server_error(status)),
            None => Ok(PollReply::default()),
        }
    }

    async fn post_text(
        &self,
        user_id: &str,
        endpoint: ChatEndpoint,
        request: &ChatTextRequest,
    ) -> Result<(), BackendError> {
        self.record(RecordedCall::PostText {
            user_id: user_id.to_string(),
            endpoint,
            request: request.clone(),
        });
        if self.state.lock().unwrap().fail_posts {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), BackendError> {
        self.record(RecordedCall::ClearHistory(user_id.to_string()));
        if self.state.lock().unwrap().fail_clear {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(())
    }

    async fn account(
        &self,
        action: AccountAction,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        self.record(RecordedCall::Account {
            action,
            user_id: credentials.user_id.clone(),
        });
        if self.state.lock().unwrap().fail_account {
            return Err(server_error(StatusCode::UNAUTHORIZED));
        }
        Ok(())
    }

    fn file_url(&self, user_id: &str, file: &str) -> Result<Url, BackendError> {
        construct_api_url("http://backend.test", &["users", user_id, "files", file])
            .map_err(BackendError::InvalidUrl)
    }

    async fn download_file(
        &self,
        user_id: &str,
        file: &str,
        destination: &Path,
    ) -> Result<u64, BackendError> {
        self.record(RecordedCall::Download {
            user_id: user_id.to_string(),
            file: file.to_string(),
        });
        let bytes = self.state.lock().unwrap().file_bytes.clone();
        tokio::fs::write(destination, &bytes)
            .await
            .map_err(BackendError::Io)?;
        Ok(bytes.len() as u64)
    }
}

/// App wired to `backend` as user "alice", without storage or a viewer.
pub fn create_test_app(backend: &ScriptedBackend) -> App {
    let controller = SessionController::new(
        Arc::new(backend.clone()),
        "alice",
        None,
        ControllerOptions {
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(5),
        },
    );
    App::new(
        controller,
        LoggingState::new(None).expect("logging state"),
        "http://backend.test",
        None,
        std::env::temp_dir().join("labchat-test-previews"),
    )
}

pub struct CannedResponse {
    pub status_line: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status_line: "200 OK",
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn empty() -> Self {
        Self {
            status_line: "200 OK",
            content_type: "application/json",
            body: b"null".to_vec(),
        }
    }

    pub fn status(status_line: &'static str) -> Self {
        Self {
            status_line,
            content_type: "text/plain",
            body: b"boom".to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Serves one canned response per connection, in order, then exits with the
/// captured requests.
pub async fn spawn_http_server(
    responses: Vec<CannedResponse>,
) -> (String, JoinHandle<Result<Vec<CapturedRequest>, String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            captured.push(read_http_request(&mut stream).await?);

            let head = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                response.status_line,
                response.content_type,
                response.body.len()
            );
            stream
                .write_all(head.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream
                .write_all(&response.body)
                .await
                .map_err(|err| err.to_string())?;
            stream.flush().await.map_err(|err| err.to_string())?;
        }
        Ok(captured)
    });

    (addr.to_string(), handle)
}

async fn read_http_request(
    stream: &mut tokio::net::TcpStream,
) -> Result<CapturedRequest, String> {
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
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
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
