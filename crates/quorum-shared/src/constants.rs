//! Product-level tuning constants.
//!
//! The reputation scheme went through several mutually inconsistent revisions
//! in the original product. This is the canonical one: a vote is worth the
//! target's weight per point of change, so removing or reversing a vote
//! always undoes exactly what casting it added, and posting grants a small
//! fixed amount that deleting the post takes back.

/// Reputation the author of a question gains per net upvote (and loses per
/// net downvote).
pub const QUESTION_VOTE_WEIGHT: i64 = 5;

/// Reputation the author of an answer gains per net upvote.
pub const ANSWER_VOTE_WEIGHT: i64 = 10;

/// Reputation granted for posting a question or an answer. Deleting the
/// post reverses the grant.
pub const POST_REPUTATION_GRANT: i64 = 2;

/// Maximum number of questions returned by the list endpoint.
pub const QUESTION_LIST_LIMIT: u32 = 20;

/// Size of the recent-notification window. The unread count is computed
/// over this window only, so it is an approximation bounded by the window
/// size rather than a true total.
pub const NOTIFICATION_WINDOW: u32 = 20;

/// Upper bound on question titles, in characters.
pub const MAX_TITLE_LEN: usize = 300;

/// Upper bound on question/answer/reply bodies, in characters.
pub const MAX_BODY_LEN: usize = 30_000;
