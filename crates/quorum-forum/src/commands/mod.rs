//! Command functions: one module per screen of the original product.
//!
//! Every command takes the shared [`Forum`](crate::Forum) state plus the
//! caller's identity, performs its reads and writes through the typed store
//! helpers, and emits events for live subscribers.

pub mod answers;
pub mod notifications;
pub mod profile;
pub mod questions;
pub mod replies;
pub mod voting;

use chrono::{DateTime, Utc};

use quorum_shared::{NotificationId, NotificationKind, QuestionId, UserId};
use quorum_store::Notification;

use crate::error::{ForumError, Result};

/// Trim and bounds-check a required text field.
pub(crate) fn required_text(value: &str, what: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ForumError::Validation(format!("Please fill in the {what}")));
    }
    if trimmed.chars().count() > max_len {
        return Err(ForumError::Validation(format!(
            "The {what} is too long (max {max_len} characters)"
        )));
    }
    Ok(trimmed.to_string())
}


/// Build one mention notification per tagged user.
pub(crate) fn mention_notifications(
    tagged: &[UserId],
    sender_name: &str,
    question_id: QuestionId,
    question_title: &str,
    at: DateTime<Utc>,
) -> Vec<Notification> {
    tagged
        .iter()
        .map(|&recipient_id| Notification {
            id: NotificationId::new(),
            recipient_id,
            sender_name: sender_name.to_string(),
            question_id,
            question_title: question_title.to_string(),
            kind: NotificationKind::Mention,
            is_read: false,
            created_at: at,
        })
        .collect()
}
