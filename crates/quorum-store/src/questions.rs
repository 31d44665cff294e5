use rusqlite::params;

use quorum_shared::constants::POST_REPUTATION_GRANT;
use quorum_shared::{QuestionId, QuestionSort, UserId};

use crate::database::{not_found, parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::{Notification, Question};
use crate::notifications::insert_notifications_tx;

impl Database {
    /// Persist a new question atomically: the question row, the author's
    /// `questions_asked` counter and post reputation grant, and the mention
    /// notification fan-out all commit together or not at all.
    pub fn insert_question(
        &mut self,
        question: &Question,
        notifications: &[Notification],
    ) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO questions (id, title, body, raw_body, author_id, author_name,
                                    author_photo, created_at, vote_count, answer_count,
                                    tagged_uids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                question.id.to_string(),
                question.title,
                question.body,
                question.raw_body,
                question.author_id.to_string(),
                question.author_name,
                question.author_photo,
                question.created_at.to_rfc3339(),
                question.vote_count,
                question.answer_count,
                serde_json::to_string(&question.tagged_uids)
                    .unwrap_or_else(|_| "[]".to_string()),
            ],
        )?;

        tx.execute(
            "UPDATE users SET questions_asked = questions_asked + 1,
                              reputation = reputation + ?1
             WHERE id = ?2",
            params![POST_REPUTATION_GRANT, question.author_id.to_string()],
        )?;

        insert_notifications_tx(&tx, notifications)?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_question(&self, id: QuestionId) -> Result<Question> {
        self.conn()
            .query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
                params![id.to_string()],
                row_to_question,
            )
            .map_err(not_found)
    }

    /// The front-page question list.
    pub fn list_questions(&self, sort: QuestionSort, limit: u32) -> Result<Vec<Question>> {
        let order = match sort {
            QuestionSort::Newest => "created_at DESC",
            QuestionSort::Votes => "vote_count DESC, created_at DESC",
            QuestionSort::Answers => "answer_count DESC, created_at DESC",
        };

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY {order} LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_question)?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    /// Delete a question. Author-only, and only while it has no answers.
    ///
    /// Both conditions are re-checked inside the transaction, so an answer
    /// posted between the caller's read and this call aborts the delete
    /// instead of orphaning it.
    pub fn delete_question(&mut self, id: QuestionId, requester: UserId) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let (author_str, answer_count): (String, i64) = tx
            .query_row(
                "SELECT author_id, answer_count FROM questions WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(not_found)?;

        if author_str != requester.to_string() {
            return Err(StoreError::NotAuthor);
        }

        // Trust the actual rows over the cached counter.
        let live_answers: i64 = tx.query_row(
            "SELECT COUNT(*) FROM answers WHERE question_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        if answer_count > 0 || live_answers > 0 {
            return Err(StoreError::QuestionHasAnswers);
        }

        tx.execute(
            "DELETE FROM votes WHERE target_kind = 'questions' AND target_id = ?1",
            params![id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM questions WHERE id = ?1",
            params![id.to_string()],
        )?;
        tx.execute(
            "UPDATE users SET questions_asked = questions_asked - 1,
                              reputation = reputation - ?1
             WHERE id = ?2",
            params![POST_REPUTATION_GRANT, author_str],
        )?;

        tx.commit()?;

        tracing::info!(question = %id, "question deleted");
        Ok(())
    }
}

pub(crate) const QUESTION_COLUMNS: &str = "id, title, body, raw_body, author_id, author_name, \
     author_photo, created_at, vote_count, answer_count, tagged_uids";

pub(crate) fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    let id_str: String = row.get(0)?;
    let author_str: String = row.get(4)?;
    let ts_str: String = row.get(7)?;
    let tagged_json: String = row.get(10)?;

    let tagged_uids: Vec<UserId> = serde_json::from_str(&tagged_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Question {
        id: QuestionId(parse_uuid(0, &id_str)?),
        title: row.get(1)?,
        body: row.get(2)?,
        raw_body: row.get(3)?,
        author_id: UserId(parse_uuid(4, &author_str)?),
        author_name: row.get(5)?,
        author_photo: row.get(6)?,
        created_at: parse_timestamp(7, &ts_str)?,
        vote_count: row.get(8)?,
        answer_count: row.get(9)?,
        tagged_uids,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use super::*;
    use crate::models::User;

    /// Insert a question by `author` and return it. Test-only.
    pub(crate) fn seed_question(db: &mut Database, author: &User, title: &str) -> Question {
        let question = Question {
            id: QuestionId::new(),
            title: title.to_string(),
            body: "body".to_string(),
            raw_body: "body".to_string(),
            author_id: author.id,
            author_name: author.display_name.clone(),
            author_photo: None,
            created_at: Utc::now(),
            vote_count: 0,
            answer_count: 0,
            tagged_uids: Vec::new(),
        };
        db.insert_question(&question, &[]).unwrap();
        question
    }
}
