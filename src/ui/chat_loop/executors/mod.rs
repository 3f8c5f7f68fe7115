//! Runs the [`CommandResult`]s that slash-command handlers hand back.
//!
//! Handlers stay synchronous; anything that waits on the backend (clearing,
//! account requests, previews) happens here, inside the chat loop.

use tracing::debug;

use crate::app::App;
use crate::commands::CommandResult;
use crate::core::backend::AccountAction;
use crate::core::controller::SubmitResult;
use crate::core::preview::{preview_file, resolve_target};

use super::LoopControl;

pub async fn execute(app: &mut App, result: CommandResult) -> LoopControl {
    match result {
        CommandResult::Continue => {}
        CommandResult::ProcessAsMessage(text) => {
            let outcome = app.controller.submit(&text);
            report_submit(app, outcome);
        }
        CommandResult::Retry => match app.controller.retry() {
            Some(outcome) => report_submit(app, outcome),
            None => app.info("Nothing to retry"),
        },
        CommandResult::ClearHistory => {
            if app.controller.clear_history().await.is_ok() {
                app.rendered = 0;
                app.info("History cleared");
            }
        }
        CommandResult::Authenticate {
            action,
            user_id,
            password,
        } => {
            if app
                .controller
                .authenticate(action, &user_id, &password)
                .await
                .is_ok()
            {
                let verb = match action {
                    AccountAction::SignUp => "Signed up",
                    AccountAction::LogIn => "Logged in",
                };
                app.info(format!("{verb} as {user_id}"));
            }
        }
        CommandResult::Preview(arg) => open_preview(app, &arg).await,
        CommandResult::Quit => return LoopControl::Quit,
    }
    LoopControl::Continue
}

fn report_submit(app: &mut App, outcome: SubmitResult) {
    match outcome {
        SubmitResult::Sent { turn } => debug!(turn, "user turn submitted"),
        SubmitResult::Empty => {}
        SubmitResult::Busy => {
            app.info("Still waiting for the previous message; try again once it lands")
        }
    }
}

async fn open_preview(app: &mut App, arg: &str) {
    let file = match resolve_target(app.controller.state().transcript(), arg) {
        Ok(file) => file,
        Err(message) => {
            app.info(message);
            return;
        }
    };

    let user_id = app.controller.state().user_id().to_string();
    let result = preview_file(
        app.controller.backend(),
        &user_id,
        &file,
        &app.cache_dir,
        app.viewer.as_deref(),
    )
    .await;

    match result {
        Ok(outcome) => {
            let where_to = match &outcome.opened_with {
                Some(viewer) => format!("opened with {viewer}"),
                None => "no viewer configured; set one with `labchat set viewer <program>`"
                    .to_string(),
            };
            app.info(format!(
                "{file}: saved {} bytes to {} ({where_to})",
                outcome.bytes,
                outcome.saved_to.display()
            ));
            app.info(format!("Source: {}", outcome.url));
        }
        Err(err) => app.info(format!("Preview failed: {err}")),
    }
}
