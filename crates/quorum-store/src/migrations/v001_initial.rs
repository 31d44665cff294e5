//! v001 -- Initial schema creation.
//!
//! Creates the six core tables: `users`, `questions`, `answers`, `replies`,
//! `votes`, and `notifications`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (auth identity + public profile in one row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    display_name    TEXT NOT NULL,
    first_name      TEXT,
    last_name       TEXT,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,              -- argon2 PHC string
    photo_url       TEXT,
    reputation      INTEGER NOT NULL DEFAULT 0,
    questions_asked INTEGER NOT NULL DEFAULT 0,
    answers_given   INTEGER NOT NULL DEFAULT 0,
    join_date       TEXT NOT NULL               -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Questions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS questions (
    id           TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    title        TEXT NOT NULL,
    body         TEXT NOT NULL,                 -- escaped + mention-highlighted HTML
    raw_body     TEXT NOT NULL,                 -- plain text as typed
    author_id    TEXT NOT NULL,                 -- FK -> users(id)
    author_name  TEXT NOT NULL,                 -- display snapshot at post time
    author_photo TEXT,
    created_at   TEXT NOT NULL,
    vote_count   INTEGER NOT NULL DEFAULT 0,    -- cached SUM of votes rows
    answer_count INTEGER NOT NULL DEFAULT 0,    -- cached COUNT of answers rows
    tagged_uids  TEXT NOT NULL DEFAULT '[]',    -- JSON array of mentioned user ids

    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_questions_votes   ON questions(vote_count DESC);

-- ----------------------------------------------------------------
-- Answers
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS answers (
    id           TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    question_id  TEXT NOT NULL,                 -- FK -> questions(id)
    body         TEXT NOT NULL,
    raw_body     TEXT NOT NULL,
    author_id    TEXT NOT NULL,
    author_name  TEXT NOT NULL,
    author_photo TEXT,
    created_at   TEXT NOT NULL,
    vote_count   INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (question_id) REFERENCES questions(id),
    FOREIGN KEY (author_id)   REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id);

-- ----------------------------------------------------------------
-- Replies (threaded under answers, no voting)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS replies (
    id           TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    answer_id    TEXT NOT NULL,                 -- FK -> answers(id)
    question_id  TEXT NOT NULL,
    body         TEXT NOT NULL,
    author_id    TEXT NOT NULL,
    author_name  TEXT NOT NULL,
    author_photo TEXT,
    created_at   TEXT NOT NULL,

    FOREIGN KEY (answer_id) REFERENCES answers(id),
    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_replies_answer   ON replies(answer_id);
CREATE INDEX IF NOT EXISTS idx_replies_question ON replies(question_id);

-- ----------------------------------------------------------------
-- Votes (one row per user per target; absence means no vote)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS votes (
    target_kind TEXT NOT NULL,                  -- 'questions' | 'answers'
    target_id   TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    value       INTEGER NOT NULL CHECK (value IN (-1, 1)),

    PRIMARY KEY (target_kind, target_id, user_id)
);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    recipient_id   TEXT NOT NULL,               -- FK -> users(id)
    sender_name    TEXT NOT NULL,
    question_id    TEXT NOT NULL,
    question_title TEXT NOT NULL,
    kind           TEXT NOT NULL,               -- 'mention'
    is_read        INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at     TEXT NOT NULL,

    FOREIGN KEY (recipient_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient
    ON notifications(recipient_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
