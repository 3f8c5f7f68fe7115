use super::*;
use crate::api::{ChatTextRequest, PollReply};
use crate::core::backend::ChatEndpoint;
use crate::core::message::Message;
use crate::core::session::{NoticeKind, SEND_FAILED_NOTICE};
use crate::utils::test_utils::{RecordedCall, ScriptedBackend};
use tempfile::TempDir;

fn options() -> ControllerOptions {
    ControllerOptions {
        poll_interval: Duration::from_millis(1000),
        request_timeout: Duration::from_secs(5),
    }
}

fn controller(backend: &ScriptedBackend) -> SessionController {
    SessionController::new(Arc::new(backend.clone()), "alice", None, options())
}

async fn settle(controller: &mut SessionController) -> SessionEvent {
    let event = controller.next_event().await.expect("event");
    controller.handle(event.clone());
    event
}

#[tokio::test]
async fn send_appends_user_message_before_delivery() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);

    let result = controller.submit("hi");

    assert_eq!(result, SubmitResult::Sent { turn: 1 });
    assert_eq!(
        controller.state().transcript().snapshot(),
        [Message::user("hi")]
    );
    assert!(controller.state().is_pending());
    assert!(backend.calls().is_empty());

    let event = settle(&mut controller).await;
    assert_eq!(event, SessionEvent::SendSucceeded { turn: 1 });
    assert!(!controller.state().is_pending());
    assert_eq!(controller.state().draft(), None);
    assert_eq!(
        backend.calls(),
        [RecordedCall::PostText {
            user_id: "alice".to_string(),
            endpoint: ChatEndpoint::Chat,
            request: ChatTextRequest {
                text: "hi".to_string(),
                settings: UserSettings::default(),
            },
        }]
    );
}

#[tokio::test]
async fn empty_submit_sends_nothing() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);

    assert_eq!(controller.submit(""), SubmitResult::Empty);
    tokio::task::yield_now().await;

    assert!(controller.state().transcript().is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn failed_send_notifies_and_keeps_message() {
    let backend = ScriptedBackend::new();
    backend.fail_posts(true);
    let mut controller = controller(&backend);

    controller.submit("hi");
    let event = settle(&mut controller).await;

    assert_eq!(event, SessionEvent::SendFailed { turn: 1 });
    assert!(!controller.state().is_pending());
    assert_eq!(controller.state().transcript().len(), 1);
    let notice = controller.take_notice().expect("notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, SEND_FAILED_NOTICE);

    backend.fail_posts(false);
    assert_eq!(controller.retry(), Some(SubmitResult::Sent { turn: 2 }));
    settle(&mut controller).await;
    assert_eq!(controller.state().transcript().len(), 2);
    assert_eq!(controller.state().draft(), None);
    assert_eq!(controller.retry(), None);
}

#[tokio::test]
async fn second_submit_waits_for_outstanding_turn() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);

    controller.submit("one");
    assert_eq!(controller.submit("two"), SubmitResult::Busy);
    assert_eq!(controller.state().transcript().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn polled_reply_lands_in_transcript_and_routes_next_send() {
    let backend = ScriptedBackend::new();
    let mut references = std::collections::HashMap::new();
    references.insert("doc.pdf".to_string(), serde_json::json!(1));
    backend.queue_reply(PollReply {
        valid: true,
        reply_text: "Which one?".to_string(),
        references: Some(references),
        inner_chat: true,
        ..PollReply::default()
    });
    let mut controller = controller(&backend);
    controller.start_polling();

    let event = settle(&mut controller).await;
    assert!(matches!(event, SessionEvent::PollSucceeded { .. }));
    let messages = controller.state().transcript().snapshot();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Which one?");
    assert_eq!(messages[0].files(), ["doc.pdf".to_string()]);
    assert!(controller.state().inner_chat_active());

    controller.submit("the first");
    assert!(!controller.state().shows_busy_indicator());
    loop {
        if let SessionEvent::SendSucceeded { .. } = settle(&mut controller).await {
            break;
        }
    }
    let posts: Vec<_> = backend.non_poll_calls();
    assert!(matches!(
        posts.as_slice(),
        [RecordedCall::PostText {
            endpoint: ChatEndpoint::InnerChat,
            ..
        }]
    ));
    controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn empty_polls_leave_state_untouched() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);
    controller.start_polling();

    for _ in 0..5 {
        let event = settle(&mut controller).await;
        assert!(matches!(event, SessionEvent::PollEmpty { .. }));
    }
    assert!(controller.state().transcript().is_empty());
    assert!(!controller.state().inner_chat_active());
    controller.shutdown();
}

#[tokio::test]
async fn clear_history_empties_only_after_backend_confirms() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);
    controller.submit("hi");
    settle(&mut controller).await;

    backend.fail_clear(true);
    assert!(controller.clear_history().await.is_err());
    assert_eq!(controller.state().transcript().len(), 1);
    assert!(controller.take_notice().is_some());

    backend.fail_clear(false);
    controller.clear_history().await.expect("clear");
    assert!(controller.state().transcript().snapshot().is_empty());
    assert_eq!(
        backend.non_poll_calls().last(),
        Some(&RecordedCall::ClearHistory("alice".to_string()))
    );
}

#[tokio::test]
async fn login_replaces_identity_only_on_success() {
    let backend = ScriptedBackend::new();
    let mut controller = controller(&backend);

    backend.fail_account(true);
    assert!(controller
        .authenticate(AccountAction::LogIn, "bob", "pw")
        .await
        .is_err());
    assert_eq!(controller.state().user_id(), "alice");

    backend.fail_account(false);
    controller
        .authenticate(AccountAction::SignUp, "bob", "pw")
        .await
        .expect("sign-up");
    assert_eq!(controller.state().user_id(), "bob");

    controller.submit("hello");
    settle(&mut controller).await;
    assert!(matches!(
        backend.non_poll_calls().last(),
        Some(RecordedCall::PostText { user_id, .. }) if user_id == "bob"
    ));
}

#[tokio::test]
async fn settings_persist_and_ride_along_with_sends() {
    let dir = TempDir::new().expect("temp dir");
    let storage = LocalStorage::new(dir.path().join("storage.json"));
    let backend = ScriptedBackend::new();
    let mut controller = SessionController::new(
        Arc::new(backend.clone()),
        "alice",
        Some(storage.clone()),
        options(),
    );

    let enabled = controller
        .update_setting(SettingKey::EnableInstruct, None)
        .expect("persist");
    assert!(enabled);
    controller.submit("hi");
    settle(&mut controller).await;
    match backend.calls().as_slice() {
        [RecordedCall::PostText { request, .. }] => assert!(request.settings.enable_instruct),
        other => panic!("unexpected calls {other:?}"),
    }
    drop(controller);

    let reloaded = SessionController::new(Arc::new(backend), "alice", Some(storage), options());
    assert!(reloaded.state().settings().enable_instruct);
    assert!(!reloaded.state().settings().enable_comment);
}

#[tokio::test]
async fn every_failed_inner_chat_turn_is_reported() {
    let backend = ScriptedBackend::new();
    backend.fail_posts(true);
    let mut controller = controller(&backend);
    controller.handle(SessionEvent::from_poll(
        1,
        "alice",
        PollReply {
            valid: true,
            reply_text: "Which one?".to_string(),
            inner_chat: true,
            ..PollReply::default()
        },
    ));

    assert_eq!(controller.submit("first"), SubmitResult::Sent { turn: 1 });
    assert_eq!(controller.submit("second"), SubmitResult::Sent { turn: 2 });

    for _ in 0..2 {
        let event = settle(&mut controller).await;
        assert!(matches!(event, SessionEvent::SendFailed { .. }));
        let notice = controller.take_notice().expect("failure notice");
        assert_eq!(notice.text, SEND_FAILED_NOTICE);
    }
    assert!(!controller.state().is_pending());
    assert_eq!(controller.state().draft(), Some("second"));
}
