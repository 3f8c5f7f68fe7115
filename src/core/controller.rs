//! The single owner of session state.
//!
//! Background tasks (the poller and one task per send) only talk to the
//! controller through its event channel; user actions call its methods.
//! Either way every change goes through [`SessionState::apply`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::Credentials;
use crate::core::backend::{AccountAction, BackendError, ChatBackend};
use crate::core::dispatcher::{spawn_send, SendJob};
use crate::core::poller::{
    replace_identity, shared_identity, spawn_poller, PollerParams, SharedIdentity,
};
use crate::core::session::{Notice, SessionEvent, SessionState, Transition};
use crate::core::settings::{LocalStorage, SettingKey, StorageError, UserSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    Sent { turn: u64 },
    Empty,
    /// A non-inner turn is still waiting for the backend.
    Busy,
}

pub struct SessionController {
    state: SessionState,
    backend: Arc<dyn ChatBackend>,
    storage: Option<LocalStorage>,
    options: ControllerOptions,
    identity: SharedIdentity,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    cancel_token: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Settings are read from `storage` when one is given and written back on
    /// every change.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        user_id: impl Into<String>,
        storage: Option<LocalStorage>,
        options: ControllerOptions,
    ) -> Self {
        let user_id = user_id.into();
        let settings = storage
            .as_ref()
            .map(UserSettings::load)
            .unwrap_or_default();
        let identity = shared_identity(user_id.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: SessionState::new(user_id, settings),
            backend,
            storage,
            options,
            identity,
            events_tx,
            events_rx,
            cancel_token: CancellationToken::new(),
            poller: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.state.take_notice()
    }

    pub fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    pub fn start_polling(&mut self) {
        if self.poller.is_some() {
            return;
        }
        let params = PollerParams {
            backend: Arc::clone(&self.backend),
            identity: Arc::clone(&self.identity),
            interval: self.options.poll_interval,
            request_timeout: self.options.request_timeout,
            cancel_token: self.cancel_token.child_token(),
            tx: self.events_tx.clone(),
        };
        self.poller = Some(spawn_poller(params));
    }

    /// Next outcome reported by a background task.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn handle(&mut self, event: SessionEvent) -> Transition {
        let transition = self.state.apply(event);
        if let Transition::Ignored(reason) = transition {
            debug!(?reason, "dropped session event");
        }
        transition
    }

    /// Appends the user turn immediately and posts it in the background.
    pub fn submit(&mut self, text: &str) -> SubmitResult {
        if text.trim().is_empty() {
            return SubmitResult::Empty;
        }
        if self.state.shows_busy_indicator() {
            return SubmitResult::Busy;
        }

        let transition = self.state.apply(SessionEvent::SendStarted {
            text: text.to_string(),
        });
        let Transition::TurnStarted(turn) = transition else {
            return SubmitResult::Empty;
        };

        let job = SendJob::new(
            turn,
            self.state.user_id(),
            self.state.inner_chat_active(),
            text,
            self.state.settings(),
        );
        debug!(turn, endpoint = job.endpoint.path(), "dispatching user turn");
        spawn_send(
            Arc::clone(&self.backend),
            job,
            self.cancel_token.child_token(),
            self.events_tx.clone(),
        );
        SubmitResult::Sent { turn }
    }

    /// Resends the draft left behind by a failed send.
    pub fn retry(&mut self) -> Option<SubmitResult> {
        if self.state.is_pending() {
            return Some(SubmitResult::Busy);
        }
        let draft = self.state.draft()?.to_string();
        Some(self.submit(&draft))
    }

    /// Asks the backend to forget the conversation, then empties the local
    /// transcript. On failure the transcript is left alone.
    pub async fn clear_history(&mut self) -> Result<(), BackendError> {
        let user_id = self.state.user_id().to_string();
        match self.backend.clear_history(&user_id).await {
            Ok(()) => {
                self.state.apply(SessionEvent::HistoryCleared);
                Ok(())
            }
            Err(err) => {
                warn!("clear history failed: {err}");
                self.state.set_notice(Notice::error("Failed to clear history"));
                Err(err)
            }
        }
    }

    /// Signs up or logs in; on success later requests use `user_id`.
    pub async fn authenticate(
        &mut self,
        action: AccountAction,
        user_id: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let credentials = Credentials {
            user_id: user_id.to_string(),
            password: password.to_string(),
        };
        match self.backend.account(action, &credentials).await {
            Ok(()) => {
                self.state.apply(SessionEvent::IdentityChanged {
                    user_id: credentials.user_id.clone(),
                });
                replace_identity(&self.identity, credentials.user_id);
                Ok(())
            }
            Err(err) => {
                warn!(action = action.path(), "account request failed: {err}");
                self.state.set_notice(Notice::error("Authentication failed"));
                Err(err)
            }
        }
    }

    /// Sets `key` (or flips it when `value` is `None`) and persists the
    /// settings. Returns the new value.
    pub fn update_setting(
        &mut self,
        key: SettingKey,
        value: Option<bool>,
    ) -> Result<bool, StorageError> {
        let mut settings = self.state.settings();
        let next = value.unwrap_or(!settings.get(key));
        settings.set(key, next);
        self.state.set_settings(settings);
        if let Some(storage) = &self.storage {
            settings.save(storage)?;
        }
        Ok(next)
    }

    /// Stops the poller and abandons in-flight sends.
    pub fn shutdown(&mut self) {
        self.cancel_token.cancel();
        self.poller.take();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests;
