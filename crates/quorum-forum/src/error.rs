use thiserror::Error;

use quorum_store::StoreError;

/// Errors produced by forum commands. Every remote-operation failure ends
/// up here as a typed value; nothing panics the caller.
#[derive(Error, Debug)]
pub enum ForumError {
    /// Authentication failure, already mapped to a user-facing message.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A delete or edit was attempted by someone other than the author.
    #[error("Only the author can do that")]
    NotAuthor,

    /// Someone tried to vote on their own content.
    #[error("You cannot vote on your own post")]
    SelfVote,

    /// A question delete was attempted while answers still reference it.
    #[error("A question with answers cannot be deleted")]
    QuestionHasAnswers,

    /// The target vanished between the caller's read and the action.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Rejected input (empty title, oversized body, bad direction, ...).
    #[error("{0}")]
    Validation(String),

    /// Anything the store could not complete.
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Unexpected internal failure (token encoding and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ForumError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SelfVote => ForumError::SelfVote,
            StoreError::NotAuthor => ForumError::NotAuthor,
            StoreError::QuestionHasAnswers => ForumError::QuestionHasAnswers,
            StoreError::NotFound => ForumError::NotFound("record"),
            StoreError::EmailTaken => ForumError::Auth(AuthError::EmailTaken),
            other => ForumError::Store(other),
        }
    }
}

/// Authentication errors with stable, user-facing messages. The original
/// product mapped provider error codes to friendly strings; these are the
/// equivalents.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Password must be at least 8 characters")]
    WeakPassword,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please choose a display name")]
    MissingDisplayName,

    #[error("Your session has expired, please sign in again")]
    TokenExpired,

    #[error("Invalid session token")]
    TokenInvalid,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ForumError>;
