//! Session state and the named transitions that are the only way to change it.
//!
//! Everything the poller and the dispatcher learn from the network is turned
//! into a [`SessionEvent`] and applied here by the single owner of the state.
//! Poll results carry a sequence number and sends carry a turn number so that
//! late or superseded results are dropped instead of applied out of order.

use crate::api::PollReply;
use crate::core::message::Message;
use crate::core::settings::UserSettings;
use crate::core::transcript::Transcript;

/// Generic text shown when a request is rejected.
pub const SEND_FAILED_NOTICE: &str = "Failed to send message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The backend had a reply ready for `user_id`.
    PollSucceeded {
        seq: u64,
        user_id: String,
        message: Message,
        inner_chat: bool,
    },
    /// The backend had nothing new, or the poll failed.
    PollEmpty { seq: u64, user_id: String },
    /// The user submitted `text`.
    SendStarted { text: String },
    SendSucceeded { turn: u64 },
    SendFailed { turn: u64 },
    /// The backend confirmed the history reset.
    HistoryCleared,
    /// Log-in or sign-up succeeded for `user_id`.
    IdentityChanged { user_id: String },
}

impl SessionEvent {
    /// Maps a decoded poll reply to the matching transition.
    pub fn from_poll(seq: u64, user_id: impl Into<String>, reply: PollReply) -> Self {
        let user_id = user_id.into();
        if !reply.valid {
            return SessionEvent::PollEmpty { seq, user_id };
        }
        let referenced_files = reply.referenced_files();
        let auxiliary_note = reply.extra_info.filter(|note| !note.trim().is_empty());
        SessionEvent::PollSucceeded {
            seq,
            user_id,
            message: Message::system(reply.reply_text, auxiliary_note, referenced_files),
            inner_chat: reply.inner_chat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    EmptyInput,
    StalePoll,
    ForeignIdentity,
    StaleTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    TurnStarted(u64),
    Ignored(Ignored),
}

#[derive(Debug, Clone)]
pub struct SessionState {
    transcript: Transcript,
    inner_chat_active: bool,
    pending_turn: Option<u64>,
    next_turn: u64,
    last_poll_seq: u64,
    user_id: String,
    settings: UserSettings,
    draft: Option<String>,
    notice: Option<Notice>,
}

impl SessionState {
    pub fn new(user_id: impl Into<String>, settings: UserSettings) -> Self {
        Self {
            transcript: Transcript::new(),
            inner_chat_active: false,
            pending_turn: None,
            next_turn: 1,
            last_poll_seq: 0,
            user_id: user_id.into(),
            settings,
            draft: None,
            notice: None,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) -> Transition {
        match event {
            SessionEvent::PollSucceeded {
                seq,
                user_id,
                message,
                inner_chat,
            } => {
                if let Some(ignored) = self.accept_poll(seq, &user_id) {
                    return Transition::Ignored(ignored);
                }
                self.transcript.append(message);
                self.inner_chat_active = inner_chat;
                Transition::Applied
            }
            SessionEvent::PollEmpty { seq, user_id } => match self.accept_poll(seq, &user_id) {
                Some(ignored) => Transition::Ignored(ignored),
                None => Transition::Applied,
            },
            SessionEvent::SendStarted { text } => {
                if text.trim().is_empty() {
                    return Transition::Ignored(Ignored::EmptyInput);
                }
                let turn = self.next_turn;
                self.next_turn += 1;
                self.transcript.append(Message::user(text.clone()));
                self.pending_turn = Some(turn);
                self.draft = Some(text);
                Transition::TurnStarted(turn)
            }
            SessionEvent::SendSucceeded { turn } => {
                if self.pending_turn != Some(turn) {
                    return Transition::Ignored(Ignored::StaleTurn);
                }
                self.pending_turn = None;
                self.draft = None;
                Transition::Applied
            }
            SessionEvent::SendFailed { turn } => {
                // Every failure is reported; only the current turn owns the
                // pending flag and the draft.
                self.notice = Some(Notice::error(SEND_FAILED_NOTICE));
                if self.pending_turn == Some(turn) {
                    self.pending_turn = None;
                }
                Transition::Applied
            }
            SessionEvent::HistoryCleared => {
                self.transcript.clear();
                Transition::Applied
            }
            SessionEvent::IdentityChanged { user_id } => {
                self.user_id = user_id;
                Transition::Applied
            }
        }
    }

    fn accept_poll(&mut self, seq: u64, user_id: &str) -> Option<Ignored> {
        if seq <= self.last_poll_seq {
            return Some(Ignored::StalePoll);
        }
        if user_id != self.user_id {
            return Some(Ignored::ForeignIdentity);
        }
        self.last_poll_seq = seq;
        None
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn inner_chat_active(&self) -> bool {
        self.inner_chat_active
    }

    pub fn is_pending(&self) -> bool {
        self.pending_turn.is_some()
    }

    /// Inner-chat turns never block the input.
    pub fn shows_busy_indicator(&self) -> bool {
        self.is_pending() && !self.inner_chat_active
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn settings(&self) -> UserSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
    }

    /// Text of the last send that has not been confirmed.
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
