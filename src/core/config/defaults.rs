use crate::core::config::data::Config;
use std::time::Duration;

pub const DEFAULT_SERVER_ADDRESS: &str = "localhost:6006";
pub const DEFAULT_USER_ID: &str = "guest";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by `labchat set` / `labchat unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "server-address",
    "user-id",
    "poll-interval-ms",
    "request-timeout-secs",
    "viewer",
];

impl Config {
    pub fn server_address(&self) -> &str {
        self.server_address
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_SERVER_ADDRESS)
    }

    pub fn user_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_USER_ID)
    }

    pub fn poll_interval(&self) -> Duration {
        let millis = self
            .poll_interval_ms
            .filter(|millis| *millis > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(millis)
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Viewer program from the config file, then `$PDF_VIEWER`.
    pub fn viewer(&self) -> Option<String> {
        self.viewer
            .clone()
            .or_else(|| std::env::var("PDF_VIEWER").ok())
            .filter(|value| !value.trim().is_empty())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {key}"));
        }
        match key {
            "server-address" => self.server_address = Some(value.to_string()),
            "user-id" => self.user_id = Some(value.to_string()),
            "poll-interval-ms" => self.poll_interval_ms = Some(parse_positive(key, value)?),
            "request-timeout-secs" => {
                self.request_timeout_secs = Some(parse_positive(key, value)?)
            }
            "viewer" => self.viewer = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "server-address" => self.server_address = None,
            "user-id" => self.user_id = None,
            "poll-interval-ms" => self.poll_interval_ms = None,
            "request-timeout-secs" => self.request_timeout_secs = None,
            "viewer" => self.viewer = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(format!("{key} must be a positive integer, got '{value}'")),
    }
}

fn unknown_key(key: &str) -> String {
    format!("Unknown config key: {key} (expected one of {})", CONFIG_KEYS.join(", "))
}
