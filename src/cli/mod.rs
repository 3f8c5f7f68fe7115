//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod account;
pub mod preferences;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::app::App;
use crate::cli::account::run_account;
use crate::cli::preferences::run_settings;
use crate::core::backend::{AccountAction, HttpBackend};
use crate::core::config::Config;
use crate::core::controller::{ControllerOptions, SessionController};
use crate::core::preview::default_cache_dir;
use crate::core::settings::LocalStorage;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LoggingState};

#[derive(Parser)]
#[command(name = "labchat")]
#[command(about = "A terminal chat client for the lab assistant backend")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")"))]
#[command(
    long_about = "labchat talks to a lab assistant chat backend from the terminal. Messages are \
posted to the backend and replies are picked up by polling, so answers may arrive a moment \
after you send.\n\n\
Configuration:\n\
  labchat set server-address host:port    Backend address (default localhost:6006)\n\
  labchat set user-id <name>              Default user (default guest)\n\
  labchat set viewer <program>            Program used by /open (falls back to $PDF_VIEWER)\n\n\
Environment Variables:\n\
  LABCHAT_LOG       Diagnostic log filter, e.g. labchat=debug (default warn)\n\
  PDF_VIEWER        Viewer for referenced files when none is configured\n\n\
Commands:\n\
  /help             List chat commands\n\
  /open <n>         Preview a file referenced by the latest reply\n\
  /log <filename>   Enable logging to specified file\n\
  /log              Toggle logging pause/resume"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend address for this run, overriding the configured one
    #[arg(short = 's', long, global = true, value_name = "HOST:PORT")]
    pub server: Option<String>,

    /// User for this run, overriding the configured one
    #[arg(short = 'u', long, global = true, value_name = "USER")]
    pub user: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Write diagnostic tracing output to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Create an account and make it the default user
    Signup {
        user: String,
        /// Read from stdin when omitted
        password: Option<String>,
    },
    /// Log in and make the account the default user
    Login {
        user: String,
        /// Read from stdin when omitted
        password: Option<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (multiple words are joined)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
    /// Show or change reply settings (speech, instruct, comment)
    Settings {
        /// Setting to change; all settings are printed when omitted
        key: Option<String>,
        /// on or off; flips the setting when omitted
        value: Option<String>,
    },
}

/// Connection parameters after applying per-run overrides to the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub server_address: String,
    pub user_id: String,
    pub options: ControllerOptions,
    pub viewer: Option<String>,
}

impl SessionOptions {
    pub fn resolve(config: &Config, server: Option<&str>, user: Option<&str>) -> Self {
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            server_address: non_empty(server)
                .unwrap_or_else(|| config.server_address().to_string()),
            user_id: non_empty(user).unwrap_or_else(|| config.user_id().to_string()),
            options: ControllerOptions {
                poll_interval: config.poll_interval(),
                request_timeout: config.request_timeout(),
            },
            viewer: config.viewer(),
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug_log.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(err) = runtime.block_on(async_main(args)) {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            let session =
                SessionOptions::resolve(&config, args.server.as_deref(), args.user.as_deref());
            start_chat(session, args.log).await
        }
        Commands::Signup { user, password } => {
            run_account(
                AccountAction::SignUp,
                &user,
                password,
                args.server.as_deref(),
            )
            .await
        }
        Commands::Login { user, password } => {
            run_account(
                AccountAction::LogIn,
                &user,
                password,
                args.server.as_deref(),
            )
            .await
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            println!("Config file: {}", Config::get_config_path()?.display());
            config.print_all();
            Ok(())
        }
        Commands::Settings { key, value } => {
            let storage =
                LocalStorage::default_location().ok_or("Could not determine data directory")?;
            run_settings(&storage, key.as_deref(), value.as_deref())
        }
    }
}

async fn start_chat(session: SessionOptions, log: Option<String>) -> Result<(), Box<dyn Error>> {
    let backend = HttpBackend::new(&session.server_address, session.options.request_timeout)?;
    let server_label = backend.base_url().to_string();
    debug!(server = %server_label, user = %session.user_id, "starting chat session");

    let storage = LocalStorage::default_location();
    let controller = SessionController::new(
        Arc::new(backend),
        session.user_id,
        storage,
        session.options,
    );
    let logging = LoggingState::new(log)?;
    let app = App::new(
        controller,
        logging,
        server_label,
        session.viewer,
        default_cache_dir(),
    );
    run_chat(app).await
}
