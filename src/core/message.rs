use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranscriptRole {
    User,
    System,
}

/// One turn of the conversation. Messages are never edited once they are in
/// the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
    /// Commentary rendered as a blockquote under a system reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_note: Option<String>,
    /// Files the reply refers to, offered for preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_files: Option<Vec<String>>,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::System => "system",
        }
    }

    pub fn is_user(self) -> bool {
        self == TranscriptRole::User
    }

    pub fn is_system(self) -> bool {
        self == TranscriptRole::System
    }
}

impl AsRef<str> for TranscriptRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "system" => Ok(TranscriptRole::System),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            content: content.into(),
            auxiliary_note: None,
            referenced_files: None,
        }
    }

    pub fn system(
        content: impl Into<String>,
        auxiliary_note: Option<String>,
        referenced_files: Option<Vec<String>>,
    ) -> Self {
        Self {
            role: TranscriptRole::System,
            content: content.into(),
            auxiliary_note,
            referenced_files,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_system(&self) -> bool {
        self.role.is_system()
    }

    /// Referenced files, empty when the reply carried none.
    pub fn files(&self) -> &[String] {
        self.referenced_files.as_deref().unwrap_or(&[])
    }
}
