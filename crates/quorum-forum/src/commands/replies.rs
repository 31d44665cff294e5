use chrono::Utc;
use tracing::info;

use quorum_shared::constants::MAX_BODY_LEN;
use quorum_shared::{escape_html, AnswerId, ReplyId};
use quorum_store::{Reply, User};

use crate::commands::required_text;
use crate::error::Result;
use crate::events::ForumEvent;
use crate::forum::Forum;

/// Post a reply under an answer. Replies are plain text: the body is
/// escaped but not scanned for mentions.
pub fn post_reply(forum: &Forum, author: &User, answer_id: AnswerId, body: String) -> Result<Reply> {
    let text = required_text(&body, "reply", MAX_BODY_LEN)?;

    let reply = {
        let mut db = forum.db();
        let answer = db.get_answer(answer_id)?;

        let reply = Reply {
            id: ReplyId::new(),
            answer_id,
            question_id: answer.question_id,
            body: escape_html(&text),
            author_id: author.id,
            author_name: author.display_name.clone(),
            author_photo: author.photo_url.clone(),
            created_at: Utc::now(),
        };
        db.insert_reply(&reply)?;
        reply
    };

    forum.events().emit(ForumEvent::ReplyPosted {
        answer_id,
        reply_id: reply.id,
    });

    info!(reply = %reply.id, answer = %answer_id, author = %author.id, "reply posted");

    Ok(reply)
}

/// Delete a reply. Author-only.
pub fn delete_reply(forum: &Forum, requester: &User, id: ReplyId) -> Result<()> {
    let answer_id = forum.db().delete_reply(id, requester.id)?;
    forum.events().emit(ForumEvent::ReplyDeleted {
        reply_id: id,
        answer_id,
    });
    Ok(())
}
