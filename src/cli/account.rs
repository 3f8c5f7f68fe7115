//! `labchat signup` / `labchat login`

use std::error::Error;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::Credentials;
use crate::cli::SessionOptions;
use crate::core::backend::{AccountAction, ChatBackend, HttpBackend};
use crate::core::config::Config;

pub async fn run_account(
    action: AccountAction,
    user_id: &str,
    password: Option<String>,
    server: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let session = SessionOptions::resolve(&config, server, Some(user_id));
    let password = match password {
        Some(password) => password,
        None => read_password().await?,
    };

    let backend = HttpBackend::new(&session.server_address, session.options.request_timeout)?;
    remember_account(&backend, action, user_id, &password, &mut config).await?;
    config.save()?;

    let verb = match action {
        AccountAction::SignUp => "Signed up",
        AccountAction::LogIn => "Logged in",
    };
    println!(
        "✅ {verb} as {user_id} on {}; saved as the default user",
        backend.base_url()
    );
    Ok(())
}

/// Performs the account request and, only when it succeeds, records
/// `user_id` as the configured default user.
pub async fn remember_account(
    backend: &dyn ChatBackend,
    action: AccountAction,
    user_id: &str,
    password: &str,
    config: &mut Config,
) -> Result<(), Box<dyn Error>> {
    let user_id = user_id.trim();
    if user_id.is_empty() || password.is_empty() {
        return Err("Both a user and a password are required".into());
    }

    let credentials = Credentials {
        user_id: user_id.to_string(),
        password: password.to_string(),
    };
    backend
        .account(action, &credentials)
        .await
        .map_err(|err| format!("Authentication failed: {err}"))?;

    config.user_id = Some(credentials.user_id);
    Ok(())
}

async fn read_password() -> Result<String, Box<dyn Error>> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
