//! Wire payloads exchanged with the chat backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::core::settings::UserSettings;

/// Body of `GET /users/{id}/response`.
///
/// Every field defaults so that partial or oddly shaped replies decode as
/// "no new reply" instead of failing the poll.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PollReply {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub reply_text: String,
    /// File identifier mapped to a backend-specific rank. Only the keys matter.
    #[serde(default)]
    pub references: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub extra_info: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub inner_chat: bool,
}

impl PollReply {
    /// Referenced file identifiers in lexicographic order.
    pub fn referenced_files(&self) -> Option<Vec<String>> {
        self.references.as_ref().map(|references| {
            let mut files: Vec<String> = references.keys().cloned().collect();
            files.sort();
            files
        })
    }
}

/// Body of `POST /users/{id}/chat_text` and `POST /users/{id}/inner_chat_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTextRequest {
    pub text: String,
    #[serde(flatten)]
    pub settings: UserSettings,
}

/// Body of `POST /accounts/sign-up` and `POST /accounts/log-in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}
