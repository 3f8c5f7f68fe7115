//! HTTP access to the chat backend.
//!
//! [`ChatBackend`] is the seam between session logic and the network; the
//! poller, the dispatcher and the controller only ever see the trait.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{StatusCode, Url};
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::api::{ChatTextRequest, Credentials, PollReply};
use crate::utils::url::{base_url_from_address, construct_api_url};

/// Which conversation a user message is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEndpoint {
    /// Start of a new exchange.
    Chat,
    /// Answer to a question the assistant asked mid-exchange.
    InnerChat,
}

impl ChatEndpoint {
    pub fn for_mode(inner_chat_active: bool) -> Self {
        if inner_chat_active {
            ChatEndpoint::InnerChat
        } else {
            ChatEndpoint::Chat
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            ChatEndpoint::Chat => "chat_text",
            ChatEndpoint::InnerChat => "inner_chat_text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    SignUp,
    LogIn,
}

impl AccountAction {
    pub fn path(self) -> &'static str {
        match self {
            AccountAction::SignUp => "sign-up",
            AccountAction::LogIn => "log-in",
        }
    }
}

#[derive(Debug)]
pub enum BackendError {
    /// The configured server address does not form a usable URL.
    InvalidUrl(String),
    /// Connection, timeout, or body transfer failure.
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: StatusCode, body: String },
    /// The body could not be decoded.
    Decode(serde_json::Error),
    /// A downloaded file could not be written locally.
    Io(std::io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::InvalidUrl(message) => write!(f, "{message}"),
            BackendError::Transport(err) => write!(f, "request failed: {err}"),
            BackendError::Status { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "server returned {status}")
                } else {
                    write!(f, "server returned {status}: {body}")
                }
            }
            BackendError::Decode(err) => write!(f, "unexpected response body: {err}"),
            BackendError::Io(err) => write!(f, "failed to save file: {err}"),
        }
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::InvalidUrl(_) | BackendError::Status { .. } => None,
            BackendError::Transport(err) => Some(err),
            BackendError::Decode(err) => Some(err),
            BackendError::Io(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err)
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `GET /users/{user}/response`
    async fn fetch_reply(&self, user_id: &str) -> Result<PollReply, BackendError>;

    /// `POST /users/{user}/chat_text` or `/inner_chat_text`
    async fn post_text(
        &self,
        user_id: &str,
        endpoint: ChatEndpoint,
        request: &ChatTextRequest,
    ) -> Result<(), BackendError>;

    /// `POST /users/{user}/clear_history`
    async fn clear_history(&self, user_id: &str) -> Result<(), BackendError>;

    /// `POST /accounts/sign-up` or `/accounts/log-in`
    async fn account(
        &self,
        action: AccountAction,
        credentials: &Credentials,
    ) -> Result<(), BackendError>;

    /// Location of a referenced file on the backend.
    fn file_url(&self, user_id: &str, file: &str) -> Result<Url, BackendError>;

    /// `GET /users/{user}/files/{file}` streamed into `destination`.
    /// Returns the number of bytes written.
    async fn download_file(
        &self,
        user_id: &str,
        file: &str,
        destination: &Path,
    ) -> Result<u64, BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(server_address: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, server_address))
    }

    pub fn with_client(client: reqwest::Client, server_address: &str) -> Self {
        Self {
            client,
            base_url: base_url_from_address(server_address),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        construct_api_url(&self.base_url, segments).map_err(BackendError::InvalidUrl)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        Err(BackendError::Status { status, body })
    }

    async fn post_empty(&self, url: Url) -> Result<(), BackendError> {
        debug!(%url, "POST");
        let response = self.client.post(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_reply(&self, user_id: &str) -> Result<PollReply, BackendError> {
        let url = self.url(&["users", user_id, "response"])?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(PollReply::default());
        }
        serde_json::from_str(&body).map_err(BackendError::Decode)
    }

    async fn post_text(
        &self,
        user_id: &str,
        endpoint: ChatEndpoint,
        request: &ChatTextRequest,
    ) -> Result<(), BackendError> {
        let url = self.url(&["users", user_id, endpoint.path()])?;
        debug!(%url, "POST chat text");
        let response = self.client.post(url).json(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), BackendError> {
        let url = self.url(&["users", user_id, "clear_history"])?;
        self.post_empty(url).await
    }

    async fn account(
        &self,
        action: AccountAction,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        let url = self.url(&["accounts", action.path()])?;
        debug!(%url, user = %credentials.user_id, "POST account");
        let response = self.client.post(url).json(credentials).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn file_url(&self, user_id: &str, file: &str) -> Result<Url, BackendError> {
        self.url(&["users", user_id, "files", file])
    }

    async fn download_file(
        &self,
        user_id: &str,
        file: &str,
        destination: &Path,
    ) -> Result<u64, BackendError> {
        let url = self.file_url(user_id, file)?;
        debug!(%url, "GET file");
        let response = Self::check(self.client.get(url).send().await?).await?;

        let mut out = tokio::fs::File::create(destination)
            .await
            .map_err(BackendError::Io)?;
        let mut written = 0_u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await.map_err(BackendError::Io)?;
            written += chunk.len() as u64;
        }
        out.flush().await.map_err(BackendError::Io)?;
        Ok(written)
    }
}
