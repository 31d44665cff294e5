use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use quorum_shared::constants::{MAX_BODY_LEN, MAX_TITLE_LEN, QUESTION_LIST_LIMIT};
use quorum_shared::{resolve_mentions, QuestionId, QuestionSort, UserId};
use quorum_store::{Answer, Question, Reply, User};

use crate::commands::{mention_notifications, required_text};
use crate::error::Result;
use crate::events::ForumEvent;
use crate::forum::Forum;

/// Ask-question form input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
}

/// One answer with its reply thread, as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerThread {
    pub answer: Answer,
    pub replies: Vec<Reply>,
}

/// Everything the question detail page renders.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub question: Question,
    pub answers: Vec<AnswerThread>,
}

/// Post a question. Mentions in the body are resolved against the cached
/// directory; the question row, the author's counters and the notification
/// fan-out commit atomically.
pub fn ask_question(forum: &Forum, author: &User, input: NewQuestion) -> Result<Question> {
    let title = required_text(&input.title, "title", MAX_TITLE_LEN)?;
    let raw_body = required_text(&input.body, "body", MAX_BODY_LEN)?;

    let now = Utc::now();
    let question_id = QuestionId::new();

    let scan = {
        let mut db = forum.db();
        let directory = forum.directory().get_or_load(&db)?;
        let scan = resolve_mentions(&raw_body, &directory, author.id);

        let question = Question {
            id: question_id,
            title: title.clone(),
            body: scan.html.clone(),
            raw_body,
            author_id: author.id,
            author_name: author.display_name.clone(),
            author_photo: author.photo_url.clone(),
            created_at: now,
            vote_count: 0,
            answer_count: 0,
            tagged_uids: scan.tagged.clone(),
        };
        let notifications =
            mention_notifications(&scan.tagged, &author.display_name, question_id, &title, now);

        db.insert_question(&question, &notifications)?;
        scan
    };

    forum.events().emit(ForumEvent::QuestionPosted {
        question_id,
        author_name: author.display_name.clone(),
    });
    for &recipient_id in &scan.tagged {
        forum
            .events()
            .emit(ForumEvent::NotificationsChanged { recipient_id });
    }

    info!(
        question = %question_id,
        author = %author.id,
        mentions = scan.tagged.len(),
        "question posted"
    );

    forum.db().get_question(question_id).map_err(Into::into)
}

/// The front page: most recent / most voted / most answered questions.
pub fn list_questions(forum: &Forum, sort: QuestionSort) -> Result<Vec<Question>> {
    Ok(forum.db().list_questions(sort, QUESTION_LIST_LIMIT)?)
}

/// Load the detail page. When a signed-in viewer opens it, their mention
/// notifications for this question are marked read — best effort, a failure
/// there never breaks the view.
pub fn question_detail(
    forum: &Forum,
    viewer: Option<UserId>,
    id: QuestionId,
) -> Result<QuestionDetail> {
    let detail = {
        let db = forum.db();
        let question = db.get_question(id)?;
        let answers = db.list_answers(id)?;

        let mut replies_by_answer: HashMap<_, Vec<Reply>> = HashMap::new();
        for reply in db.list_replies_for_question(id)? {
            replies_by_answer
                .entry(reply.answer_id)
                .or_default()
                .push(reply);
        }

        let answers = answers
            .into_iter()
            .map(|answer| {
                let replies = replies_by_answer.remove(&answer.id).unwrap_or_default();
                AnswerThread { answer, replies }
            })
            .collect();

        if let Some(viewer_id) = viewer {
            match db.mark_question_notifications_read(viewer_id, id) {
                Ok(marked) if marked > 0 => {
                    forum.events().emit(ForumEvent::NotificationsChanged {
                        recipient_id: viewer_id,
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to mark notifications read"),
            }
        }

        QuestionDetail { question, answers }
    };

    Ok(detail)
}

/// Delete a question. Author-only and only while unanswered; both are
/// enforced inside the store transaction.
pub fn delete_question(forum: &Forum, requester: &User, id: QuestionId) -> Result<()> {
    forum.db().delete_question(id, requester.id)?;
    forum
        .events()
        .emit(ForumEvent::QuestionDeleted { question_id: id });
    Ok(())
}
