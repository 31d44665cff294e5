//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to an API or UI layer. These are the validated, typed records
//! the schemaless documents of the original data model map onto.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quorum_shared::{AnswerId, NotificationId, NotificationKind, QuestionId, ReplyId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A signed-up user. One row serves as both the auth identity and the
/// public profile; the password hash is stored alongside but never leaves
/// the `users` module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
    /// Derived rolling counter maintained by vote, post and delete events.
    pub reputation: i64,
    pub questions_asked: i64,
    pub answers_given: i64,
    pub join_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// A question thread root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// HTML-escaped body with mentions highlighted.
    pub body: String,
    /// The plain text exactly as the author typed it.
    pub raw_body: String,
    pub author_id: UserId,
    /// Display name snapshot taken at post time.
    pub author_name: String,
    pub author_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Cached sum of this question's vote rows.
    pub vote_count: i64,
    /// Cached count of answer rows referencing this question.
    pub answer_count: i64,
    /// Users mentioned in the body at post time.
    pub tagged_uids: Vec<UserId>,
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// An answer to a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub body: String,
    pub raw_body: String,
    pub author_id: UserId,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A threaded reply under an answer. Replies carry no votes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub id: ReplyId,
    pub answer_id: AnswerId,
    pub question_id: QuestionId,
    pub body: String,
    pub author_id: UserId,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A per-recipient notification record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_name: String,
    pub question_id: QuestionId,
    pub question_title: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
