//! Referenced-file preview: fetch the file from the backend and hand it to a
//! viewer program.

use directories::ProjectDirs;
use reqwest::Url;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::backend::ChatBackend;
use crate::core::transcript::Transcript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutcome {
    pub url: Url,
    pub saved_to: PathBuf,
    pub bytes: u64,
    /// Viewer program that was launched, if any.
    pub opened_with: Option<String>,
}

/// Resolves `/open` arguments. A number picks from the files of the most
/// recent reply that referenced any (1-based); anything else is taken as a
/// file identifier verbatim.
pub fn resolve_target(transcript: &Transcript, arg: &str) -> Result<String, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("Usage: /open <number|path>".to_string());
    }

    let Ok(index) = arg.parse::<usize>() else {
        return Ok(arg.to_string());
    };

    let files = transcript
        .snapshot()
        .iter()
        .rev()
        .find(|message| message.is_system() && !message.files().is_empty())
        .map(|message| message.files())
        .ok_or_else(|| "No referenced files yet".to_string())?;

    index
        .checked_sub(1)
        .and_then(|i| files.get(i))
        .cloned()
        .ok_or_else(|| format!("No file #{index} (latest reply lists {})", files.len()))
}

/// Directory previews are downloaded into.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("org", "labchat", "labchat")
        .map(|dirs| dirs.cache_dir().join("previews"))
        .unwrap_or_else(|| std::env::temp_dir().join("labchat-previews"))
}

/// Local file name for a backend file identifier.
pub fn cache_file_name(file: &str) -> String {
    let name = file
        .rsplit(['/', '\\'])
        .find(|part| !part.trim().is_empty())
        .unwrap_or("")
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "preview.pdf".to_string()
    } else {
        name.to_string()
    }
}

pub async fn preview_file(
    backend: &dyn ChatBackend,
    user_id: &str,
    file: &str,
    cache_dir: &Path,
    viewer: Option<&str>,
) -> Result<PreviewOutcome, Box<dyn Error>> {
    let url = backend.file_url(user_id, file)?;
    tokio::fs::create_dir_all(cache_dir).await?;
    let saved_to = cache_dir.join(cache_file_name(file));
    let bytes = backend.download_file(user_id, file, &saved_to).await?;
    debug!(%url, path = %saved_to.display(), bytes, "downloaded preview");

    let opened_with = match viewer {
        Some(viewer) => {
            let _ = launch_viewer(viewer, &saved_to)?;
            Some(viewer.to_string())
        }
        None => None,
    };

    Ok(PreviewOutcome {
        url,
        saved_to,
        bytes,
        opened_with,
    })
}

/// Starts the viewer without blocking the chat. A blocking task waits on the
/// child so it is reaped when it exits; the returned handle yields its status.
fn launch_viewer(
    viewer: &str,
    path: &Path,
) -> Result<JoinHandle<Option<ExitStatus>>, Box<dyn Error>> {
    let mut parts = viewer.split_whitespace();
    let program = parts.next().ok_or("Viewer command is empty")?;
    let mut child = Command::new(program)
        .args(parts)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| format!("Failed to launch viewer '{program}': {err}"))?;

    let program = program.to_string();
    Ok(tokio::task::spawn_blocking(move || match child.wait() {
        Ok(status) => {
            debug!(viewer = %program, %status, "viewer exited");
            Some(status)
        }
        Err(err) => {
            debug!(viewer = %program, "waiting on viewer failed: {err}");
            None
        }
    }))
}
