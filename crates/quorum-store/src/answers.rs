use rusqlite::params;

use quorum_shared::constants::POST_REPUTATION_GRANT;
use quorum_shared::{AnswerId, QuestionId, UserId};

use crate::database::{not_found, parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::{Answer, Notification};
use crate::notifications::insert_notifications_tx;

impl Database {
    /// Persist a new answer atomically with the parent question's
    /// `answer_count`, the author's counters, and any mention fan-out.
    ///
    /// The counter update doubles as the existence check: if the question
    /// vanished since the caller read it, nothing is written.
    pub fn insert_answer(&mut self, answer: &Answer, notifications: &[Notification]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let affected = tx.execute(
            "UPDATE questions SET answer_count = answer_count + 1 WHERE id = ?1",
            params![answer.question_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO answers (id, question_id, body, raw_body, author_id, author_name,
                                  author_photo, created_at, vote_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                answer.id.to_string(),
                answer.question_id.to_string(),
                answer.body,
                answer.raw_body,
                answer.author_id.to_string(),
                answer.author_name,
                answer.author_photo,
                answer.created_at.to_rfc3339(),
                answer.vote_count,
            ],
        )?;

        tx.execute(
            "UPDATE users SET answers_given = answers_given + 1,
                              reputation = reputation + ?1
             WHERE id = ?2",
            params![POST_REPUTATION_GRANT, answer.author_id.to_string()],
        )?;

        insert_notifications_tx(&tx, notifications)?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_answer(&self, id: AnswerId) -> Result<Answer> {
        self.conn()
            .query_row(
                &format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?1"),
                params![id.to_string()],
                row_to_answer,
            )
            .map_err(not_found)
    }

    /// Answers for a question, best-voted first, ties broken oldest-first.
    pub fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers
             WHERE question_id = ?1
             ORDER BY vote_count DESC, created_at ASC"
        ))?;

        let rows = stmt.query_map(params![question_id.to_string()], row_to_answer)?;

        let mut answers = Vec::new();
        for row in rows {
            answers.push(row?);
        }
        Ok(answers)
    }

    /// Delete an answer and everything hanging off it in one transaction:
    /// its replies, its votes, the parent question's `answer_count`, and
    /// the author's `answers_given` counter and post grant. An observer
    /// never sees the answer gone while a reply remains.
    pub fn delete_answer(&mut self, id: AnswerId, requester: UserId) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let (author_str, question_str): (String, String) = tx
            .query_row(
                "SELECT author_id, question_id FROM answers WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(not_found)?;

        if author_str != requester.to_string() {
            return Err(StoreError::NotAuthor);
        }

        tx.execute(
            "DELETE FROM replies WHERE answer_id = ?1",
            params![id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM votes WHERE target_kind = 'answers' AND target_id = ?1",
            params![id.to_string()],
        )?;
        tx.execute("DELETE FROM answers WHERE id = ?1", params![id.to_string()])?;
        tx.execute(
            "UPDATE questions SET answer_count = answer_count - 1 WHERE id = ?1",
            params![question_str],
        )?;
        tx.execute(
            "UPDATE users SET answers_given = answers_given - 1,
                              reputation = reputation - ?1
             WHERE id = ?2",
            params![POST_REPUTATION_GRANT, author_str],
        )?;

        tx.commit()?;

        tracing::info!(answer = %id, "answer deleted with its replies");
        Ok(())
    }
}

pub(crate) const ANSWER_COLUMNS: &str = "id, question_id, body, raw_body, author_id, \
     author_name, author_photo, created_at, vote_count";

pub(crate) fn row_to_answer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Answer> {
    let id_str: String = row.get(0)?;
    let question_str: String = row.get(1)?;
    let author_str: String = row.get(4)?;
    let ts_str: String = row.get(7)?;

    Ok(Answer {
        id: AnswerId(parse_uuid(0, &id_str)?),
        question_id: QuestionId(parse_uuid(1, &question_str)?),
        body: row.get(2)?,
        raw_body: row.get(3)?,
        author_id: UserId(parse_uuid(4, &author_str)?),
        author_name: row.get(5)?,
        author_photo: row.get(6)?,
        created_at: parse_timestamp(7, &ts_str)?,
        vote_count: row.get(8)?,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::seed_answer;
    use super::*;
    use crate::questions::test_support::seed_question;
    use crate::replies::test_support::seed_reply;
    use crate::users::test_support::seed_user;

    #[test]
    fn insert_maintains_answer_count() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &asker, "q");

        seed_answer(&mut db, &answerer, question.id);
        seed_answer(&mut db, &answerer, question.id);

        assert_eq!(db.get_question(question.id).unwrap().answer_count, 2);
        let reloaded = db.get_user(answerer.id).unwrap();
        assert_eq!(reloaded.answers_given, 2);
        assert_eq!(reloaded.reputation, 2 * POST_REPUTATION_GRANT);
    }

    #[test]
    fn insert_under_missing_question_writes_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let answerer = seed_user(&db, "Grace");

        let orphan = Answer {
            id: AnswerId::new(),
            question_id: QuestionId::new(),
            body: "x".into(),
            raw_body: "x".into(),
            author_id: answerer.id,
            author_name: answerer.display_name.clone(),
            author_photo: None,
            created_at: chrono::Utc::now(),
            vote_count: 0,
        };

        let err = db.insert_answer(&orphan, &[]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(db.get_user(answerer.id).unwrap().answers_given, 0);
    }

    #[test]
    fn delete_cascades_replies_and_counters() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &asker, "q");
        let answer = seed_answer(&mut db, &answerer, question.id);
        seed_reply(&mut db, &asker, &answer);
        seed_reply(&mut db, &asker, &answer);

        db.delete_answer(answer.id, answerer.id).unwrap();

        assert!(matches!(db.get_answer(answer.id), Err(StoreError::NotFound)));
        assert!(db.list_replies_for_answer(answer.id).unwrap().is_empty());
        assert_eq!(db.get_question(question.id).unwrap().answer_count, 0);

        let reloaded = db.get_user(answerer.id).unwrap();
        assert_eq!(reloaded.answers_given, 0);
        assert_eq!(reloaded.reputation, 0);
    }

    #[test]
    fn delete_requires_author() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &asker, "q");
        let answer = seed_answer(&mut db, &answerer, question.id);

        let err = db.delete_answer(answer.id, asker.id).unwrap_err();
        assert!(matches!(err, StoreError::NotAuthor));
        assert_eq!(db.get_question(question.id).unwrap().answer_count, 1);
    }

    #[test]
    fn question_delete_blocked_while_answers_exist() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &asker, "q");
        seed_answer(&mut db, &answerer, question.id);

        let err = db.delete_question(question.id, asker.id).unwrap_err();
        assert!(matches!(err, StoreError::QuestionHasAnswers));
        // Nothing changed.
        assert!(db.get_question(question.id).is_ok());
        assert_eq!(db.get_user(asker.id).unwrap().questions_asked, 1);
    }

    #[test]
    fn answers_sorted_by_votes_then_age() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &asker, "q");

        let older = seed_answer(&mut db, &answerer, question.id);
        let newer = seed_answer(&mut db, &answerer, question.id);
        let best = seed_answer(&mut db, &answerer, question.id);

        db.conn()
            .execute(
                "UPDATE answers SET vote_count = 5 WHERE id = ?1",
                params![best.id.to_string()],
            )
            .unwrap();

        let listed = db.list_answers(question.id).unwrap();
        assert_eq!(listed[0].id, best.id);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(listed[2].id, newer.id);
    }
}
