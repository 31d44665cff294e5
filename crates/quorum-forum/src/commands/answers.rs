use chrono::Utc;
use tracing::info;

use quorum_shared::constants::MAX_BODY_LEN;
use quorum_shared::{resolve_mentions, AnswerId, QuestionId};
use quorum_store::{Answer, User};

use crate::commands::{mention_notifications, required_text};
use crate::error::Result;
use crate::events::ForumEvent;
use crate::forum::Forum;

/// Post an answer under a question. Mentions resolve exactly as they do in
/// question bodies, and the answer row, the question's `answer_count`, the
/// author's counters and the fan-out commit atomically.
pub fn post_answer(
    forum: &Forum,
    author: &User,
    question_id: QuestionId,
    body: String,
) -> Result<Answer> {
    let raw_body = required_text(&body, "answer", MAX_BODY_LEN)?;

    let now = Utc::now();
    let answer_id = AnswerId::new();

    let tagged = {
        let mut db = forum.db();

        // Read the question first: it supplies the notification title and
        // surfaces a clean not-found before any write.
        let question = db.get_question(question_id)?;

        let directory = forum.directory().get_or_load(&db)?;
        let scan = resolve_mentions(&raw_body, &directory, author.id);

        let answer = Answer {
            id: answer_id,
            question_id,
            body: scan.html,
            raw_body,
            author_id: author.id,
            author_name: author.display_name.clone(),
            author_photo: author.photo_url.clone(),
            created_at: now,
            vote_count: 0,
        };
        let notifications = mention_notifications(
            &scan.tagged,
            &author.display_name,
            question_id,
            &question.title,
            now,
        );

        db.insert_answer(&answer, &notifications)?;
        scan.tagged
    };

    forum.events().emit(ForumEvent::AnswerPosted {
        question_id,
        answer_id,
    });
    for &recipient_id in &tagged {
        forum
            .events()
            .emit(ForumEvent::NotificationsChanged { recipient_id });
    }

    info!(answer = %answer_id, question = %question_id, author = %author.id, "answer posted");

    Ok(forum.db().get_answer(answer_id)?)
}

/// Delete an answer and its reply thread. Author-only; the cascade runs in
/// one store transaction.
pub fn delete_answer(forum: &Forum, requester: &User, id: AnswerId) -> Result<()> {
    let question_id = {
        let mut db = forum.db();
        let answer = db.get_answer(id)?;
        db.delete_answer(id, requester.id)?;
        answer.question_id
    };

    forum.events().emit(ForumEvent::AnswerDeleted {
        answer_id: id,
        question_id,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::questions::{ask_question, NewQuestion};
    use crate::commands::test_support::{signup, test_forum};
    use crate::error::ForumError;
    use quorum_shared::constants::NOTIFICATION_WINDOW;

    #[test]
    fn answer_mentions_notify_with_question_title() {
        let forum = test_forum();
        let ada = signup(&forum, "Ada");
        let grace = signup(&forum, "Grace");
        let linus = signup(&forum, "Linus");

        let question = ask_question(
            &forum,
            &ada,
            NewQuestion {
                title: "lifetimes".into(),
                body: "body".into(),
            },
        )
        .unwrap();

        post_answer(&forum, &grace, question.id, "see @Linus for details".into()).unwrap();

        let db = forum.db();
        let items = db.list_notifications(linus.id, NOTIFICATION_WINDOW).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question_title, "lifetimes");
        assert_eq!(items[0].sender_name, "Grace");
    }

    #[test]
    fn answer_to_missing_question_is_not_found() {
        let forum = test_forum();
        let grace = signup(&forum, "Grace");

        let err = post_answer(&forum, &grace, QuestionId::new(), "hello".into()).unwrap_err();
        assert!(matches!(err, ForumError::NotFound(_)));
    }

    #[test]
    fn delete_is_author_only_and_cascades() {
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
        let answer = post_answer(&forum, &grace, question.id, "mine".into()).unwrap();
        crate::commands::replies::post_reply(&forum, &ada, answer.id, "reply".into()).unwrap();

        let err = delete_answer(&forum, &ada, answer.id).unwrap_err();
        assert!(matches!(err, ForumError::NotAuthor));

        delete_answer(&forum, &grace, answer.id).unwrap();

        let db = forum.db();
        assert_eq!(db.get_question(question.id).unwrap().answer_count, 0);
        assert!(db.list_replies_for_answer(answer.id).unwrap().is_empty());
    }
}
