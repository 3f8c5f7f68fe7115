use super::CommandResult;
use crate::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Reset the conversation on the server and clear the transcript.",
        handler: super::handle_clear,
    },
    Command {
        name: "settings",
        usage: "/settings",
        help: "Show the reply settings sent with each message.",
        handler: super::handle_settings,
    },
    Command {
        name: "speech",
        usage: "/speech [on|off]",
        help: "Toggle spoken replies.",
        handler: super::handle_toggle,
    },
    Command {
        name: "instruct",
        usage: "/instruct [on|off]",
        help: "Toggle instruct mode.",
        handler: super::handle_toggle,
    },
    Command {
        name: "comment",
        usage: "/comment [on|off]",
        help: "Toggle comment mode.",
        handler: super::handle_toggle,
    },
    Command {
        name: "open",
        usage: "/open <n|path>",
        help: "Preview file n of the latest reply, or a file by path.",
        handler: super::handle_open,
    },
    Command {
        name: "retry",
        usage: "/retry",
        help: "Resend the last message that failed to send.",
        handler: super::handle_retry,
    },
    Command {
        name: "login",
        usage: "/login <user> <password>",
        help: "Log in and continue as <user>.",
        handler: super::handle_account,
    },
    Command {
        name: "signup",
        usage: "/signup <user> <password>",
        help: "Create an account and continue as <user>.",
        handler: super::handle_account,
    },
    Command {
        name: "whoami",
        usage: "/whoami",
        help: "Show the active user and server.",
        handler: super::handle_whoami,
    },
    Command {
        name: "log",
        usage: "/log [file]",
        help: "Set the transcript log file, or pause/resume logging.",
        handler: super::handle_log,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
