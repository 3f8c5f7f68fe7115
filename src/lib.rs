//! labchat is a terminal client for a lab assistant chat backend.
//!
//! Replies arrive asynchronously, so the client posts user turns and polls
//! for answers in the background. The crate is organized in layers:
//! - [`core`] owns session state, the backend client, the poller and send
//!   dispatcher, configuration, persisted reply settings and file previews.
//! - [`ui`] runs the line-oriented chat loop and renders the transcript.
//! - [`commands`] implements slash-command parsing used by the chat loop.
//! - [`api`] defines the JSON payloads exchanged with the backend.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
