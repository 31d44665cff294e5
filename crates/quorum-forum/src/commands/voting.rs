use tracing::info;

use quorum_shared::{AnswerId, QuestionId, VoteDirection, VoteTarget};
use quorum_store::{User, VoteOutcome};

use crate::error::Result;
use crate::events::ForumEvent;
use crate::forum::Forum;

/// Vote on a question: up, down, or toggle the held direction off.
pub fn vote_question(
    forum: &Forum,
    voter: &User,
    id: QuestionId,
    direction: VoteDirection,
) -> Result<VoteOutcome> {
    cast(forum, voter, VoteTarget::Question, id.0, direction)
}

/// Vote on an answer.
pub fn vote_answer(
    forum: &Forum,
    voter: &User,
    id: AnswerId,
    direction: VoteDirection,
) -> Result<VoteOutcome> {
    cast(forum, voter, VoteTarget::Answer, id.0, direction)
}

fn cast(
    forum: &Forum,
    voter: &User,
    target: VoteTarget,
    target_id: uuid::Uuid,
    direction: VoteDirection,
) -> Result<VoteOutcome> {
    let outcome = forum
        .db()
        .cast_vote(target, target_id, voter.id, direction)?;

    forum.events().emit(ForumEvent::VoteChanged {
        target,
        target_id,
        vote_count: outcome.vote_count,
    });

    info!(
        target = target.as_str(),
        id = %target_id,
        voter = %voter.id,
        value = outcome.voter_value,
        "vote cast"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::answers::post_answer;
    use crate::commands::questions::{ask_question, NewQuestion};
    use crate::commands::test_support::{signup, test_forum};
    use crate::error::ForumError;
    use quorum_shared::constants::{ANSWER_VOTE_WEIGHT, POST_REPUTATION_GRANT};

    #[test]
    fn upvote_moves_count_and_reputation() {
        let forum = test_forum();
        let ada = signup(&forum, "Ada");
        let grace = signup(&forum, "Grace");

        let question = ask_question(
            &forum,
            &ada,
            NewQuestion {
                title: "q".into(),
                body: "body".into(),
            },
        )
        .unwrap();
        let answer = post_answer(&forum, &ada, question.id, "mine".into()).unwrap();

        let outcome = vote_answer(&forum, &grace, answer.id, VoteDirection::Up).unwrap();
        assert_eq!(outcome.vote_count, 1);
        assert_eq!(outcome.voter_value, 1);
        assert_eq!(outcome.reputation_delta, ANSWER_VOTE_WEIGHT);

        // Ada holds two post grants plus the answer upvote.
        let ada_now = forum.user(ada.id).unwrap();
        assert_eq!(
            ada_now.reputation,
            2 * POST_REPUTATION_GRANT + ANSWER_VOTE_WEIGHT
        );
    }

    #[test]
    fn self_vote_is_typed() {
        let forum = test_forum();
        let ada = signup(&forum, "Ada");

        let question = ask_question(
            &forum,
            &ada,
            NewQuestion {
                title: "q".into(),
                body: "body".into(),
            },
        )
        .unwrap();

        let err = vote_question(&forum, &ada, question.id, VoteDirection::Up).unwrap_err();
        assert!(matches!(err, ForumError::SelfVote));
    }

    #[test]
    fn vote_emits_the_new_count() {
        let forum = test_forum();
        let ada = signup(&forum, "Ada");
        let grace = signup(&forum, "Grace");

        let question = ask_question(
            &forum,
            &ada,
            NewQuestion {
                title: "q".into(),
                body: "body".into(),
            },
        )
        .unwrap();

        let mut rx = forum.events().subscribe();
        vote_question(&forum, &grace, question.id, VoteDirection::Down).unwrap();

        match rx.try_recv().unwrap() {
            ForumEvent::VoteChanged { vote_count, .. } => assert_eq!(vote_count, -1),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
