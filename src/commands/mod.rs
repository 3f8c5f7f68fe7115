//! Slash commands typed into the chat input.
//!
//! Handlers run synchronously against [`App`]; anything that needs the
//! network is handed back to the chat loop as a [`CommandResult`].

mod registry;

pub use registry::{all_commands, find_command, CommandInvocation};

use crate::app::App;
use crate::core::backend::AccountAction;
use crate::core::settings::{parse_switch, SettingKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    ClearHistory,
    Retry,
    Preview(String),
    Authenticate {
        action: AccountAction,
        user_id: String,
        password: String,
    },
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match find_command(command_name) {
        Some(command) => {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            (command.handler)(app, invocation)
        }
        None => CommandResult::ProcessAsMessage(input.to_string()),
    }
}

fn command_name(invocation: &CommandInvocation<'_>) -> String {
    invocation
        .input
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.info("Commands:");
    for command in all_commands() {
        app.info(format!("  {:<26} {}", command.usage, command.help));
    }
    app.info("Anything else is sent to the assistant. A leading '/' with an unknown command is sent as-is.");
    CommandResult::Continue
}

pub(super) fn handle_clear(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ClearHistory
}

pub(super) fn handle_settings(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let settings = app.controller.state().settings();
    for key in SettingKey::ALL {
        let state = if settings.get(key) { "on" } else { "off" };
        app.info(format!("{}: {state}", key.label()));
    }
    CommandResult::Continue
}

pub(super) fn handle_toggle(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let name = command_name(&invocation);
    let Some(key) = SettingKey::parse(&name) else {
        app.info(format!("Unknown setting: {name}"));
        return CommandResult::Continue;
    };

    let value = if invocation.args.is_empty() {
        None
    } else {
        match parse_switch(invocation.args) {
            Some(value) => Some(value),
            None => {
                app.info(format!(
                    "Usage: /{name} [on|off] (got '{}')",
                    invocation.args
                ));
                return CommandResult::Continue;
            }
        }
    };

    match app.controller.update_setting(key, value) {
        Ok(enabled) => {
            let state = if enabled { "on" } else { "off" };
            app.info(format!("{}: {state}", key.label()));
        }
        Err(err) => app.info(format!("Setting changed but not saved: {err}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_open(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.info("Usage: /open <n|path>");
        return CommandResult::Continue;
    }
    CommandResult::Preview(invocation.args.to_string())
}

pub(super) fn handle_retry(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Retry
}

pub(super) fn handle_account(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let name = command_name(&invocation);
    let action = if name == "signup" {
        AccountAction::SignUp
    } else {
        AccountAction::LogIn
    };

    let mut parts = invocation.args.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user_id), Some(password), None) => CommandResult::Authenticate {
            action,
            user_id: user_id.to_string(),
            password: password.to_string(),
        },
        _ => {
            app.info(format!("Usage: /{name} <user> <password>"));
            CommandResult::Continue
        }
    }
}

pub(super) fn handle_whoami(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let user = app.controller.state().user_id().to_string();
    let server = app.server_label.clone();
    app.info(format!("User {user} on {server}"));
    CommandResult::Continue
}

pub(super) fn handle_log(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = if invocation.args.is_empty() {
        app.logging.toggle_logging()
    } else {
        app.logging.set_log_file(invocation.args.to_string())
    };
    match result {
        Ok(message) => app.info(message),
        Err(err) => app.info(format!("Log error: {err}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
