//! The vote/reputation engine.
//!
//! One user holds at most one active vote per item, switching between up,
//! down and none. Casting the direction already held removes the vote. The
//! whole read-modify-write — the voter's row, the target's cached
//! `vote_count`, and the author's reputation — runs in a single SQLite
//! transaction, so the invariant `vote_count == SUM(votes.value)` holds at
//! every commit point.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use quorum_shared::{UserId, VoteDirection, VoteTarget};

use crate::database::{not_found, parse_uuid, Database};
use crate::error::{Result, StoreError};

/// What a vote cast changed, for re-rendering and event fan-out.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VoteOutcome {
    /// The target's cached vote count after the cast.
    pub vote_count: i64,
    /// The voter's resulting vote: -1, 0 (removed) or 1.
    pub voter_value: i64,
    /// Author of the voted content, whose reputation moved.
    pub author_id: UserId,
    /// Signed reputation change applied to the author.
    pub reputation_delta: i64,
}

impl Database {
    /// Cast, switch or remove a vote on a question or answer.
    ///
    /// Self-votes are rejected before any mutation. A missing target
    /// surfaces as [`StoreError::NotFound`].
    pub fn cast_vote(
        &mut self,
        target: VoteTarget,
        target_id: Uuid,
        voter: UserId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        // `target.as_str()` is one of two static table names, never input.
        let table = target.as_str();

        let tx = self.conn_mut().transaction()?;

        let (author_str, vote_count): (String, i64) = tx
            .query_row(
                &format!("SELECT author_id, vote_count FROM {table} WHERE id = ?1"),
                params![target_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(not_found)?;

        let author_id = UserId(parse_uuid(0, &author_str).map_err(StoreError::Sqlite)?);
        if author_id == voter {
            return Err(StoreError::SelfVote);
        }

        let prior: i64 = tx
            .query_row(
                "SELECT value FROM votes
                 WHERE target_kind = ?1 AND target_id = ?2 AND user_id = ?3",
                params![table, target_id.to_string(), voter.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        // Toggle-to-zero when re-casting the held direction.
        let new = if prior == direction.value() {
            0
        } else {
            direction.value()
        };
        let delta = new - prior;

        if new == 0 {
            tx.execute(
                "DELETE FROM votes
                 WHERE target_kind = ?1 AND target_id = ?2 AND user_id = ?3",
                params![table, target_id.to_string(), voter.to_string()],
            )?;
        } else {
            tx.execute(
                "INSERT INTO votes (target_kind, target_id, user_id, value)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (target_kind, target_id, user_id)
                 DO UPDATE SET value = excluded.value",
                params![table, target_id.to_string(), voter.to_string(), new],
            )?;
        }

        tx.execute(
            &format!("UPDATE {table} SET vote_count = vote_count + ?1 WHERE id = ?2"),
            params![delta, target_id.to_string()],
        )?;

        let reputation_delta = delta * target.weight();
        tx.execute(
            "UPDATE users SET reputation = reputation + ?1 WHERE id = ?2",
            params![reputation_delta, author_str],
        )?;

        tx.commit()?;

        let outcome = VoteOutcome {
            vote_count: vote_count + delta,
            voter_value: new,
            author_id,
            reputation_delta,
        };
        tracing::debug!(
            target = table,
            id = %target_id,
            voter = %voter,
            value = new,
            count = outcome.vote_count,
            "vote cast"
        );
        Ok(outcome)
    }

    /// The voter's current vote on a target: -1, 0 or 1.
    pub fn get_vote(&self, target: VoteTarget, target_id: Uuid, voter: UserId) -> Result<i64> {
        let value: Option<i64> = self
            .conn()
            .query_row(
                "SELECT value FROM votes
                 WHERE target_kind = ?1 AND target_id = ?2 AND user_id = ?3",
                params![target.as_str(), target_id.to_string(), voter.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::test_support::seed_answer;
    use crate::questions::test_support::seed_question;
    use crate::users::test_support::seed_user;
    use quorum_shared::constants::{ANSWER_VOTE_WEIGHT, QUESTION_VOTE_WEIGHT};

    /// SUM of vote rows for a target, straight from the table.
    fn vote_sum(db: &Database, target: VoteTarget, id: Uuid) -> i64 {
        db.conn()
            .query_row(
                "SELECT COALESCE(SUM(value), 0) FROM votes
                 WHERE target_kind = ?1 AND target_id = ?2",
                params![target.as_str(), id.to_string()],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn count_always_equals_sum_of_votes() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "Ada");
        let v1 = seed_user(&db, "Grace");
        let v2 = seed_user(&db, "Linus");
        let question = seed_question(&mut db, &author, "q");
        let qid = question.id.0;

        let casts = [
            (v1.id, VoteDirection::Up),
            (v2.id, VoteDirection::Up),
            (v1.id, VoteDirection::Down), // switch
            (v2.id, VoteDirection::Up),   // toggle off
            (v1.id, VoteDirection::Down), // toggle off
            (v2.id, VoteDirection::Down),
        ];
        for (voter, dir) in casts {
            let outcome = db.cast_vote(VoteTarget::Question, qid, voter, dir).unwrap();
            assert_eq!(outcome.vote_count, vote_sum(&db, VoteTarget::Question, qid));
            assert_eq!(
                db.get_question(question.id).unwrap().vote_count,
                outcome.vote_count
            );
        }
    }

    #[test]
    fn double_cast_is_an_idempotent_toggle() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "Ada");
        let voter = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &author, "q");
        let qid = question.id.0;

        let up = db
            .cast_vote(VoteTarget::Question, qid, voter.id, VoteDirection::Up)
            .unwrap();
        assert_eq!(up.vote_count, 1);
        assert_eq!(up.voter_value, 1);

        let off = db
            .cast_vote(VoteTarget::Question, qid, voter.id, VoteDirection::Up)
            .unwrap();
        assert_eq!(off.vote_count, 0);
        assert_eq!(off.voter_value, 0);

        // Back to pre-vote state, reputation included.
        assert_eq!(db.get_vote(VoteTarget::Question, qid, voter.id).unwrap(), 0);
        assert_eq!(
            db.get_user(author.id).unwrap().reputation,
            quorum_shared::constants::POST_REPUTATION_GRANT
        );
    }

    #[test]
    fn self_vote_is_rejected_without_mutation() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "Ada");
        let question = seed_question(&mut db, &author, "q");
        let qid = question.id.0;

        let err = db
            .cast_vote(VoteTarget::Question, qid, author.id, VoteDirection::Up)
            .unwrap_err();
        assert!(matches!(err, StoreError::SelfVote));

        assert_eq!(db.get_question(question.id).unwrap().vote_count, 0);
        assert_eq!(vote_sum(&db, VoteTarget::Question, qid), 0);
    }

    #[test]
    fn switching_reverses_then_reapplies_reputation() {
        let mut db = Database::open_in_memory().unwrap();
        let asker = seed_user(&db, "Ada");
        let answerer = seed_user(&db, "Grace");
        let voter = seed_user(&db, "Linus");
        let question = seed_question(&mut db, &asker, "q");
        let answer = seed_answer(&mut db, &answerer, question.id);
        let base = db.get_user(answerer.id).unwrap().reputation;

        let up = db
            .cast_vote(VoteTarget::Answer, answer.id.0, voter.id, VoteDirection::Up)
            .unwrap();
        assert_eq!(up.reputation_delta, ANSWER_VOTE_WEIGHT);

        // Up -> Down moves the count by 2 and reputation by 2 * weight.
        let down = db
            .cast_vote(
                VoteTarget::Answer,
                answer.id.0,
                voter.id,
                VoteDirection::Down,
            )
            .unwrap();
        assert_eq!(down.vote_count, -1);
        assert_eq!(down.reputation_delta, -2 * ANSWER_VOTE_WEIGHT);

        assert_eq!(
            db.get_user(answerer.id).unwrap().reputation,
            base - ANSWER_VOTE_WEIGHT
        );
    }

    #[test]
    fn question_and_answer_weights_differ() {
        let mut db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "Ada");
        let voter = seed_user(&db, "Grace");
        let question = seed_question(&mut db, &author, "q");

        let outcome = db
            .cast_vote(
                VoteTarget::Question,
                question.id.0,
                voter.id,
                VoteDirection::Up,
            )
            .unwrap();
        assert_eq!(outcome.reputation_delta, QUESTION_VOTE_WEIGHT);
        assert_eq!(outcome.author_id, author.id);
    }

    #[test]
    fn missing_target_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let voter = seed_user(&db, "Grace");

        let err = db
            .cast_vote(
                VoteTarget::Answer,
                Uuid::new_v4(),
                voter.id,
                VoteDirection::Up,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
