//! Live update feed.
//!
//! The original product relied on the vendor store's snapshot listeners for
//! live unread counts and re-renders. Here commands publish a [`ForumEvent`]
//! on a broadcast channel; any number of embedders (websocket fan-out, TUI,
//! tests) can subscribe.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use quorum_shared::{AnswerId, QuestionId, ReplyId, UserId, VoteTarget};

/// Everything that changes observable forum state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ForumEvent {
    QuestionPosted {
        question_id: QuestionId,
        author_name: String,
    },
    AnswerPosted {
        question_id: QuestionId,
        answer_id: AnswerId,
    },
    ReplyPosted {
        answer_id: AnswerId,
        reply_id: ReplyId,
    },
    VoteChanged {
        target: VoteTarget,
        target_id: Uuid,
        vote_count: i64,
    },
    QuestionDeleted {
        question_id: QuestionId,
    },
    AnswerDeleted {
        answer_id: AnswerId,
        question_id: QuestionId,
    },
    ReplyDeleted {
        reply_id: ReplyId,
        answer_id: AnswerId,
    },
    /// The recipient's notification list (and unread count) changed.
    NotificationsChanged {
        recipient_id: UserId,
    },
}

/// Broadcast wrapper that tolerates having no subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ForumEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ForumEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Send only fails when nobody is listening, which
    /// is normal for a headless deployment.
    pub fn emit(&self, event: ForumEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
