//! Periodic reply polling.
//!
//! One task owns the timer and awaits each request before the next tick, so
//! polls never overlap. Every result is tagged with a sequence number and the
//! identity it was made for; the session drops anything older or foreign.

use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::backend::ChatBackend;
use crate::core::session::SessionEvent;

/// User id shared between the controller and the poller.
pub type SharedIdentity = Arc<RwLock<String>>;

pub fn shared_identity(user_id: impl Into<String>) -> SharedIdentity {
    Arc::new(RwLock::new(user_id.into()))
}

pub fn current_identity(identity: &SharedIdentity) -> String {
    match identity.read() {
        Ok(user_id) => user_id.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn replace_identity(identity: &SharedIdentity, user_id: impl Into<String>) {
    let mut guard = match identity.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = user_id.into();
}

pub struct PollerParams {
    pub backend: Arc<dyn ChatBackend>,
    /// Current user identity; re-read on every tick.
    pub identity: SharedIdentity,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub cancel_token: CancellationToken,
    pub tx: mpsc::UnboundedSender<SessionEvent>,
}

pub fn spawn_poller(params: PollerParams) -> JoinHandle<()> {
    tokio::spawn(run_poller(params))
}

async fn run_poller(params: PollerParams) {
    let PollerParams {
        backend,
        identity,
        interval,
        request_timeout,
        cancel_token,
        tx,
    } = params;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0_u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        seq += 1;
        let user_id = current_identity(&identity);
        let result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            result = tokio::time::timeout(request_timeout, backend.fetch_reply(&user_id)) => result,
        };

        let event = match result {
            Ok(Ok(reply)) => {
                if let Some(error) = reply.error.as_deref() {
                    debug!(seq, %user_id, error, "backend reported an error alongside the reply");
                }
                SessionEvent::from_poll(seq, user_id, reply)
            }
            Ok(Err(err)) => {
                debug!(seq, %user_id, "poll failed: {err}");
                SessionEvent::PollEmpty { seq, user_id }
            }
            Err(_) => {
                debug!(seq, %user_id, "poll timed out after {request_timeout:?}");
                SessionEvent::PollEmpty { seq, user_id }
            }
        };

        if tx.send(event).is_err() {
            return;
        }
    }
}
