use rusqlite::{params, Transaction};

use quorum_shared::{NotificationId, NotificationKind, QuestionId, UserId};

use crate::database::{parse_timestamp, parse_uuid, Database};
use crate::error::Result;
use crate::models::Notification;

impl Database {
    /// Fan out a batch of notifications in one transaction: either every
    /// recipient gets one or none do.
    pub fn insert_notifications(&mut self, items: &[Notification]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let tx = self.conn_mut().transaction()?;
        insert_notifications_tx(&tx, items)?;
        tx.commit()?;
        Ok(())
    }

    /// The recipient's most recent notifications, newest first, bounded by
    /// `window`.
    pub fn list_notifications(&self, recipient: UserId, window: u32) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, recipient_id, sender_name, question_id, question_title,
                    kind, is_read, created_at
             FROM notifications
             WHERE recipient_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![recipient.to_string(), window], row_to_notification)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Unread count within the recent window. An approximation bounded by
    /// the window size, not a true total.
    pub fn unread_count(&self, recipient: UserId, window: u32) -> Result<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM (
                 SELECT is_read FROM notifications
                 WHERE recipient_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2
             ) WHERE is_read = 0",
            params![recipient.to_string(), window],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Mark one notification read. Recipient-scoped; returns whether a row
    /// was affected.
    pub fn mark_notification_read(&self, id: NotificationId, recipient: UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
            params![id.to_string(), recipient.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Mark every notification the recipient has for one question as read.
    /// Used when they open the question detail view.
    pub fn mark_question_notifications_read(
        &self,
        recipient: UserId,
        question_id: QuestionId,
    ) -> Result<u32> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1
             WHERE recipient_id = ?1 AND question_id = ?2 AND is_read = 0",
            params![recipient.to_string(), question_id.to_string()],
        )?;
        Ok(affected as u32)
    }

    /// Delete one notification. Recipient-scoped.
    pub fn delete_notification(&self, id: NotificationId, recipient: UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM notifications WHERE id = ?1 AND recipient_id = ?2",
            params![id.to_string(), recipient.to_string()],
        )?;
        Ok(affected > 0)
    }
}

/// Insert notification rows inside an already-open transaction. Shared by
/// the question/answer insert paths so the fan-out commits atomically with
/// the post itself.
pub(crate) fn insert_notifications_tx(
    tx: &Transaction<'_>,
    items: &[Notification],
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO notifications (id, recipient_id, sender_name, question_id,
                                    question_title, kind, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for n in items {
        stmt.execute(params![
            n.id.to_string(),
            n.recipient_id.to_string(),
            n.sender_name,
            n.question_id.to_string(),
            n.question_title,
            n.kind.as_str(),
            n.is_read,
            n.created_at.to_rfc3339(),
        ])?;
    }
    Ok(())
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let recipient_str: String = row.get(1)?;
    let question_str: String = row.get(3)?;
    let kind_str: String = row.get(5)?;
    let ts_str: String = row.get(7)?;

    let kind: NotificationKind = kind_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    Ok(Notification {
        id: NotificationId(parse_uuid(0, &id_str)?),
        recipient_id: UserId(parse_uuid(1, &recipient_str)?),
        sender_name: row.get(2)?,
        question_id: QuestionId(parse_uuid(3, &question_str)?),
        question_title: row.get(4)?,
        kind,
        is_read: row.get(6)?,
        created_at: parse_timestamp(7, &ts_str)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::users::test_support::seed_user;

    fn notification(recipient: UserId, minutes_ago: i64, title: &str) -> Notification {
        Notification {
            id: NotificationId::new(),
            recipient_id: recipient,
            sender_name: "Ada".to_string(),
            question_id: QuestionId::new(),
            question_title: title.to_string(),
            kind: NotificationKind::Mention,
            is_read: false,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn batch_insert_and_window_list() {
        let mut db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Grace");

        let items: Vec<_> = (0..5)
            .map(|i| notification(user.id, i, &format!("q{i}")))
            .collect();
        db.insert_notifications(&items).unwrap();

        let listed = db.list_notifications(user.id, 3).unwrap();
        assert_eq!(listed.len(), 3);
        // Newest first.
        assert_eq!(listed[0].question_title, "q0");
        assert_eq!(listed[2].question_title, "q2");
    }

    #[test]
    fn unread_count_is_window_bounded() {
        let mut db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Grace");

        let items: Vec<_> = (0..6)
            .map(|i| notification(user.id, i, &format!("q{i}")))
            .collect();
        db.insert_notifications(&items).unwrap();

        assert_eq!(db.unread_count(user.id, 20).unwrap(), 6);
        // Only the most recent 4 are inspected.
        assert_eq!(db.unread_count(user.id, 4).unwrap(), 4);
    }

    #[test]
    fn mark_read_is_recipient_scoped() {
        let mut db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "Alice");
        let bob = seed_user(&db, "Bob");

        let n = notification(alice.id, 0, "q");
        db.insert_notifications(std::slice::from_ref(&n)).unwrap();

        // Bob cannot touch Alice's notification.
        assert!(!db.mark_notification_read(n.id, bob.id).unwrap());
        assert!(db.mark_notification_read(n.id, alice.id).unwrap());
        assert_eq!(db.unread_count(alice.id, 20).unwrap(), 0);
    }

    #[test]
    fn question_view_marks_all_for_that_question() {
        let mut db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Grace");

        let question_id = QuestionId::new();
        let mut a = notification(user.id, 0, "same question");
        a.question_id = question_id;
        let mut b = notification(user.id, 1, "same question");
        b.question_id = question_id;
        let other = notification(user.id, 2, "other question");
        db.insert_notifications(&[a, b, other.clone()]).unwrap();

        let marked = db
            .mark_question_notifications_read(user.id, question_id)
            .unwrap();
        assert_eq!(marked, 2);
        assert_eq!(db.unread_count(user.id, 20).unwrap(), 1);
    }

    #[test]
    fn delete_is_recipient_scoped() {
        let mut db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "Alice");
        let bob = seed_user(&db, "Bob");

        let n = notification(alice.id, 0, "q");
        db.insert_notifications(std::slice::from_ref(&n)).unwrap();

        assert!(!db.delete_notification(n.id, bob.id).unwrap());
        assert!(db.delete_notification(n.id, alice.id).unwrap());
        assert!(db.list_notifications(alice.id, 20).unwrap().is_empty());
    }
}
