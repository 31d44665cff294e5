use quorum_shared::constants::NOTIFICATION_WINDOW;
use quorum_shared::NotificationId;
use quorum_store::{Notification, User};

use crate::error::{ForumError, Result};
use crate::events::ForumEvent;
use crate::forum::Forum;

/// The caller's recent notifications, newest first.
pub fn list_notifications(forum: &Forum, user: &User) -> Result<Vec<Notification>> {
    Ok(forum.db().list_notifications(user.id, NOTIFICATION_WINDOW)?)
}

/// Unread count over the recent window, for the bell badge.
pub fn unread_count(forum: &Forum, user: &User) -> Result<u32> {
    Ok(forum.db().unread_count(user.id, NOTIFICATION_WINDOW)?)
}

/// Mark one of the caller's notifications read.
pub fn mark_read(forum: &Forum, user: &User, id: NotificationId) -> Result<()> {
    let marked = forum.db().mark_notification_read(id, user.id)?;
    if !marked {
        return Err(ForumError::NotFound("notification"));
    }
    forum.events().emit(ForumEvent::NotificationsChanged {
        recipient_id: user.id,
    });
    Ok(())
}

/// Dismiss one of the caller's notifications.
pub fn dismiss(forum: &Forum, user: &User, id: NotificationId) -> Result<()> {
    let deleted = forum.db().delete_notification(id, user.id)?;
    if !deleted {
        return Err(ForumError::NotFound("notification"));
    }
    forum.events().emit(ForumEvent::NotificationsChanged {
        recipient_id: user.id,
    });
    Ok(())
}
