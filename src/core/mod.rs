pub mod backend;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod message;
pub mod poller;
pub mod preview;
pub mod session;
pub mod settings;
pub mod transcript;
