//! # quorum-shared
//!
//! Types and pure domain logic shared by every Quorum crate: typed ids for
//! each entity, the canonical reputation constants, and the mention engine
//! that turns free text into highlighted HTML plus a recipient list.

pub mod constants;
pub mod mentions;
pub mod types;

pub use mentions::{escape_html, resolve_mentions, DirectoryEntry, MentionScan};
pub use types::{
    AnswerId, NotificationId, NotificationKind, QuestionId, QuestionSort, ReplyId, UserId,
    VoteDirection, VoteTarget,
};
