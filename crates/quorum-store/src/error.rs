use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Someone tried to vote on their own content.
    #[error("You cannot vote on your own post")]
    SelfVote,

    /// A delete or edit was attempted by someone other than the author.
    #[error("Only the author can do that")]
    NotAuthor,

    /// A question delete was attempted while answers still reference it.
    #[error("A question with answers cannot be deleted")]
    QuestionHasAnswers,

    /// Sign-up with an email address that already has an account.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
