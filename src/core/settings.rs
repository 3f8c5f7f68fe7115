//! User-preference settings and the durable client-local store that keeps
//! them across restarts.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::config::data::path_display;

/// Storage key holding the JSON-encoded [`UserSettings`].
pub const USER_SETTINGS_KEY: &str = "userSettings";

/// Preferences sent verbatim with every chat request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub reply_in_speech: bool,
    #[serde(default)]
    pub enable_instruct: bool,
    #[serde(default)]
    pub enable_comment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ReplyInSpeech,
    EnableInstruct,
    EnableComment,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::ReplyInSpeech,
        SettingKey::EnableInstruct,
        SettingKey::EnableComment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ReplyInSpeech => "reply_in_speech",
            SettingKey::EnableInstruct => "enable_instruct",
            SettingKey::EnableComment => "enable_comment",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingKey::ReplyInSpeech => "Speech reply",
            SettingKey::EnableInstruct => "Instruct mode",
            SettingKey::EnableComment => "Comment mode",
        }
    }

    /// Accepts the wire name, a dashed variant, or the short command name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reply_in_speech" | "speech" => Some(SettingKey::ReplyInSpeech),
            "enable_instruct" | "instruct" => Some(SettingKey::EnableInstruct),
            "enable_comment" | "comment" => Some(SettingKey::EnableComment),
            _ => None,
        }
    }
}

/// Parses an explicit on/off value for a setting.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

impl UserSettings {
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::ReplyInSpeech => self.reply_in_speech,
            SettingKey::EnableInstruct => self.enable_instruct,
            SettingKey::EnableComment => self.enable_comment,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: bool) {
        match key {
            SettingKey::ReplyInSpeech => self.reply_in_speech = value,
            SettingKey::EnableInstruct => self.enable_instruct = value,
            SettingKey::EnableComment => self.enable_comment = value,
        }
    }

    /// Reads the stored settings. Missing or unreadable entries fall back to
    /// all-false defaults.
    pub fn load(storage: &LocalStorage) -> Self {
        let raw = match storage.get_item(USER_SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(err) => {
                warn!("falling back to default settings: {err}");
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!("ignoring malformed {USER_SETTINGS_KEY} entry: {err}");
            Self::default()
        })
    }

    pub fn save(&self, storage: &LocalStorage) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(self).map_err(StorageError::Encode)?;
        storage.set_item(USER_SETTINGS_KEY, &encoded)
    }
}

/// Errors raised by [`LocalStorage`].
#[derive(Debug)]
pub enum StorageError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read { path, source } => {
                write!(f, "Failed to read storage at {}: {}", path_display(path), source)
            }
            StorageError::Parse { path, source } => {
                write!(f, "Failed to parse storage at {}: {}", path_display(path), source)
            }
            StorageError::Encode(source) => write!(f, "Failed to encode storage value: {source}"),
            StorageError::Write { path, source } => {
                write!(f, "Failed to write storage at {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StorageError::Read { source, .. } | StorageError::Write { source, .. } => Some(source),
            StorageError::Parse { source, .. } | StorageError::Encode(source) => Some(source),
        }
    }
}

/// String key/value store persisted as one JSON object on disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory, or `None` when no home directory
    /// can be determined.
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("org", "labchat", "labchat")
            .map(|dirs| Self::new(dirs.data_dir().join("storage.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(items).map_err(StorageError::Encode)?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;
        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}
