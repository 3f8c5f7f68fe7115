//! Delivery of user messages to the backend.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatTextRequest;
use crate::core::backend::{ChatBackend, ChatEndpoint};
use crate::core::session::SessionEvent;
use crate::core::settings::UserSettings;

/// One user turn, ready to be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct SendJob {
    pub turn: u64,
    pub user_id: String,
    pub endpoint: ChatEndpoint,
    pub request: ChatTextRequest,
}

impl SendJob {
    pub fn new(
        turn: u64,
        user_id: impl Into<String>,
        inner_chat_active: bool,
        text: impl Into<String>,
        settings: UserSettings,
    ) -> Self {
        Self {
            turn,
            user_id: user_id.into(),
            endpoint: ChatEndpoint::for_mode(inner_chat_active),
            request: ChatTextRequest {
                text: text.into(),
                settings,
            },
        }
    }
}

/// Posts `job` and reports `SendSucceeded` or `SendFailed` for its turn.
/// Nothing is reported if `cancel_token` fires first.
pub fn spawn_send(
    backend: Arc<dyn ChatBackend>,
    job: SendJob,
    cancel_token: CancellationToken,
    tx: mpsc::UnboundedSender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let SendJob {
            turn,
            user_id,
            endpoint,
            request,
        } = job;

        let result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            result = backend.post_text(&user_id, endpoint, &request) => result,
        };

        let event = match result {
            Ok(()) => {
                debug!(turn, endpoint = endpoint.path(), "message delivered");
                SessionEvent::SendSucceeded { turn }
            }
            Err(err) => {
                warn!(turn, endpoint = endpoint.path(), "send failed: {err}");
                SessionEvent::SendFailed { turn }
            }
        };
        let _ = tx.send(event);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{RecordedCall, ScriptedBackend};

    #[tokio::test]
    async fn delivered_turn_reports_success() {
        let backend = ScriptedBackend::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let job = SendJob::new(7, "alice", false, "hi", UserSettings::default());

        spawn_send(Arc::new(backend.clone()), job.clone(), CancellationToken::new(), tx)
            .await
            .expect("send task");

        assert_eq!(rx.recv().await, Some(SessionEvent::SendSucceeded { turn: 7 }));
        assert_eq!(
            backend.calls(),
            [RecordedCall::PostText {
                user_id: "alice".to_string(),
                endpoint: ChatEndpoint::Chat,
                request: job.request,
            }]
        );
    }

    #[tokio::test]
    async fn rejected_turn_reports_failure() {
        let backend = ScriptedBackend::new();
        backend.fail_posts(true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let job = SendJob::new(3, "alice", true, "yes", UserSettings::default());
        assert_eq!(job.endpoint, ChatEndpoint::InnerChat);

        spawn_send(Arc::new(backend), job, CancellationToken::new(), tx)
            .await
            .expect("send task");

        assert_eq!(rx.recv().await, Some(SessionEvent::SendFailed { turn: 3 }));
    }

    #[tokio::test]
    async fn cancelled_turn_reports_nothing() {
        let backend = ScriptedBackend::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        spawn_send(
            Arc::new(backend),
            SendJob::new(1, "alice", false, "hi", UserSettings::default()),
            cancel,
            tx,
        )
        .await
        .expect("send task");

        assert_eq!(rx.recv().await, None);
    }
}
