use rusqlite::params;

use quorum_shared::{AnswerId, QuestionId, ReplyId, UserId};

use crate::database::{not_found, parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::Reply;

impl Database {
    /// Persist a reply. The parent answer is re-checked inside the
    /// transaction so a reply can never land under an answer that was
    /// deleted after the caller's read.
    pub fn insert_reply(&mut self, reply: &Reply) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM answers WHERE id = ?1",
            params![reply.answer_id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO replies (id, answer_id, question_id, body, author_id,
                                  author_name, author_photo, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                reply.id.to_string(),
                reply.answer_id.to_string(),
                reply.question_id.to_string(),
                reply.body,
                reply.author_id.to_string(),
                reply.author_name,
                reply.author_photo,
                reply.created_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn list_replies_for_answer(&self, answer_id: AnswerId) -> Result<Vec<Reply>> {
        self.list_replies("answer_id", &answer_id.to_string())
    }

    /// All replies under one question, for building the detail view in a
    /// single pass.
    pub fn list_replies_for_question(&self, question_id: QuestionId) -> Result<Vec<Reply>> {
        self.list_replies("question_id", &question_id.to_string())
    }

    fn list_replies(&self, column: &str, value: &str) -> Result<Vec<Reply>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT id, answer_id, question_id, body, author_id, author_name,
                    author_photo, created_at
             FROM replies WHERE {column} = ?1
             ORDER BY created_at ASC"
        ))?;

        let rows = stmt.query_map(params![value], row_to_reply)?;

        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }

    /// Delete a reply. Author-only. Returns the parent answer id so callers
    /// can report which thread changed.
    pub fn delete_reply(&mut self, id: ReplyId, requester: UserId) -> Result<AnswerId> {
        let tx = self.conn_mut().transaction()?;

        let (author_str, answer_str): (String, String) = tx
            .query_row(
                "SELECT author_id, answer_id FROM replies WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(not_found)?;

        if author_str != requester.to_string() {
            return Err(StoreError::NotAuthor);
        }

        tx.execute("DELETE FROM replies WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;
        Ok(AnswerId(parse_uuid(1, &answer_str)?))
    }
}

fn row_to_reply(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reply> {
    let id_str: String = row.get(0)?;
    let answer_str: String = row.get(1)?;
    let question_str: String = row.get(2)?;
    let author_str: String = row.get(4)?;
    let ts_str: String = row.get(7)?;

    Ok(Reply {
        id: ReplyId(parse_uuid(0, &id_str)?),
        answer_id: AnswerId(parse_uuid(1, &answer_str)?),
        question_id: QuestionId(parse_uuid(2, &question_str)?),
        body: row.get(3)?,
        author_id: UserId(parse_uuid(4, &author_str)?),
        author_name: row.get(5)?,
        author_photo: row.get(6)?,
        created_at: parse_timestamp(7, &ts_str)?,
    })
}
