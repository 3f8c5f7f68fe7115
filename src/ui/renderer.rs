use crate::core::message::Message;
use crate::core::session::{Notice, NoticeKind};

pub const BUSY_INDICATOR: &str = "… waiting for the assistant";

/// Formats one transcript message for the terminal. User turns carry the
/// display name; system turns show their note as a blockquote and number
/// their files the way `/open <n>` counts them.
pub fn render_message(message: &Message, user_display_name: &str) -> String {
    let mut out = if message.is_user() {
        format!("{user_display_name}: {}", message.content)
    } else {
        format!("Assistant: {}", message.content)
    };

    if let Some(note) = &message.auxiliary_note {
        for line in note.lines() {
            out.push_str("\n  > ");
            out.push_str(line);
        }
    }

    for (index, file) in message.files().iter().enumerate() {
        out.push_str(&format!("\n  [{}] {file}", index + 1));
    }
    if !message.files().is_empty() {
        out.push_str("\n  (use /open <n> to preview)");
    }

    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Info => format!("ℹ️  {}", notice.text),
        NoticeKind::Error => format!("❌ {}", notice.text),
    }
}

pub fn render_banner(server_label: &str, user_id: &str, logging_status: &str) -> String {
    format!(
        "labchat v{} - {server_label} as {user_id} • Logging: {logging_status}\nType /help for commands, /quit or Ctrl+C to leave.",
        env!("CARGO_PKG_VERSION"),
    )
}
