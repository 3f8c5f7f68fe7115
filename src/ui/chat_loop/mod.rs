//! Main chat loop.
//!
//! Reads lines from stdin, feeds them through [`crate::commands`], applies
//! background outcomes from the controller and prints whatever the transcript
//! gained since the last pass.

mod executors;

use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::app::App;
use crate::commands::process_input;
use crate::ui::renderer::{render_banner, render_message, render_notice, BUSY_INDICATOR};

pub use self::executors::execute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

pub async fn run_chat(mut app: App) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "{}",
        render_banner(
            &app.server_label,
            app.controller.state().user_id(),
            &app.logging.get_status_string()
        )
    )?;

    app.controller.start_polling();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        flush_output(&mut app, &mut stdout)?;
        stdout.flush()?;

        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if handle_line(&mut app, &line).await == LoopControl::Quit {
                    break;
                }
            }
            event = app.controller.next_event() => {
                if let Some(event) = event {
                    app.controller.handle(event);
                }
            }
        }
    }

    app.controller.shutdown();
    flush_output(&mut app, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

pub async fn handle_line(app: &mut App, line: &str) -> LoopControl {
    let result = process_input(app, line);
    execute(app, result).await
}

/// Prints transcript messages past the render cursor, then any notice, queued
/// info lines, and the busy indicator when it first appears.
pub fn flush_output<W: Write>(app: &mut App, out: &mut W) -> io::Result<()> {
    let transcript = app.controller.state().transcript();
    if transcript.len() < app.rendered {
        app.rendered = 0;
    }

    let user_id = app.controller.state().user_id();
    for message in transcript.since(app.rendered) {
        writeln!(out, "{}", render_message(message, user_id))?;
        if let Err(err) = app.logging.log_message(message, user_id) {
            warn!("transcript log write failed: {err}");
        }
    }
    app.rendered = transcript.len();

    if let Some(notice) = app.controller.take_notice() {
        writeln!(out, "{}", render_notice(&notice))?;
    }
    for line in app.take_output() {
        writeln!(out, "{line}")?;
    }

    let busy = app.controller.state().shows_busy_indicator();
    if busy && !app.was_busy {
        writeln!(out, "{BUSY_INDICATOR}")?;
    }
    app.was_busy = busy;
    Ok(())
}
