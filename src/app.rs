//! Interactive session: the controller plus the terminal-side state that
//! surrounds it (transcript log, preview settings, pending output).

use std::path::PathBuf;

use crate::core::controller::SessionController;
use crate::utils::logging::LoggingState;

pub struct App {
    pub controller: SessionController,
    pub logging: LoggingState,
    /// Shown by `/whoami` and the banner.
    pub server_label: String,
    pub viewer: Option<String>,
    pub cache_dir: PathBuf,
    /// Transcript messages already printed.
    pub rendered: usize,
    pub was_busy: bool,
    output: Vec<String>,
}

impl App {
    pub fn new(
        controller: SessionController,
        logging: LoggingState,
        server_label: impl Into<String>,
        viewer: Option<String>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            controller,
            logging,
            server_label: server_label.into(),
            viewer,
            cache_dir,
            rendered: 0,
            was_busy: false,
            output: Vec::new(),
        }
    }

    /// Queue an app-authored line. These never enter the transcript.
    pub fn info(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}
