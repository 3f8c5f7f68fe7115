use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend address, `host:port` or a full `http(s)://` URL
    pub server_address: Option<String>,
    /// User identity used in every `/users/{id}` path
    pub user_id: Option<String>,
    /// Delay between reply polls, in milliseconds
    pub poll_interval_ms: Option<u64>,
    /// Upper bound on a single backend request, in seconds
    pub request_timeout_secs: Option<u64>,
    /// Program used to open previewed files (falls back to `$PDF_VIEWER`)
    pub viewer: Option<String>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
