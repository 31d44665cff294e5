use chrono::{DateTime, Utc};
use rusqlite::params;

use quorum_shared::{DirectoryEntry, UserId};

use crate::database::{not_found, parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::User;

/// Fields a user may change on their own profile. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Database {
    /// Insert a freshly signed-up user. The password hash is an argon2 PHC
    /// string produced by the auth gateway.
    pub fn insert_user(&self, user: &User, password_hash: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, display_name, first_name, last_name, email,
                                    password_hash, photo_url, reputation,
                                    questions_asked, answers_given, join_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user.id.to_string(),
                    user.display_name,
                    user.first_name,
                    user.last_name,
                    user.email,
                    password_hash,
                    user.photo_url,
                    user.reputation,
                    user.questions_asked,
                    user.answers_given,
                    user.join_date.to_rfc3339(),
                ],
            )
            .map_err(map_email_conflict)?;
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Look up a user by email together with their password hash, for
    /// sign-in verification.
    pub fn get_user_by_email(&self, email: &str) -> Result<(User, String)> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
                params![email],
                |row| {
                    let user = row_to_user(row)?;
                    let hash: String = row.get(10)?;
                    Ok((user, hash))
                },
            )
            .map_err(not_found)
    }

    /// The full user directory, used by the mention engine. Callers cache
    /// the result per editing session; a stale read is acceptable.
    pub fn list_directory(&self) -> Result<Vec<DirectoryEntry>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, display_name FROM users ORDER BY display_name ASC")?;

        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let display_name: String = row.get(1)?;
            Ok(DirectoryEntry {
                id: UserId(parse_uuid(0, &id_str)?),
                display_name,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Apply a partial profile update. Absent fields keep their value.
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET
                 display_name = COALESCE(?1, display_name),
                 first_name   = COALESCE(?2, first_name),
                 last_name    = COALESCE(?3, last_name),
                 photo_url    = COALESCE(?4, photo_url)
             WHERE id = ?5",
            params![
                update.display_name,
                update.first_name,
                update.last_name,
                update.photo_url,
                id.to_string(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

pub(crate) const USER_COLUMNS: &str = "id, display_name, first_name, last_name, email, \
     photo_url, reputation, questions_asked, answers_given, join_date";

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let join_str: String = row.get(9)?;

    let join_date: DateTime<Utc> = parse_timestamp(9, &join_str)?;

    Ok(User {
        id: UserId(parse_uuid(0, &id_str)?),
        display_name: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        photo_url: row.get(5)?,
        reputation: row.get(6)?,
        questions_asked: row.get(7)?,
        answers_given: row.get(8)?,
        join_date,
    })
}

/// Translate a unique-constraint failure on `users.email` into the typed
/// sign-up error; everything else passes through.
fn map_email_conflict(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, Some(msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("users.email") =>
        {
            StoreError::EmailTaken
        }
        _ => StoreError::Sqlite(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Insert a user with the given display name and return it. Test-only.
    pub(crate) fn seed_user(db: &Database, name: &str) -> User {
        let user = User {
            id: UserId::new(),
            display_name: name.to_string(),
            first_name: None,
            last_name: None,
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
            photo_url: None,
            reputation: 0,
            questions_asked: 0,
            answers_given: 0,
            join_date: Utc::now(),
        };
        db.insert_user(&user, "argon2-hash-placeholder").unwrap();
        user
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::seed_user;
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Ada");

        let loaded = db.get_user(user.id).unwrap();
        assert_eq!(loaded.display_name, "Ada");
        assert_eq!(loaded.reputation, 0);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Ada");

        let mut dup = user.clone();
        dup.id = UserId::new();
        let err = db.insert_user(&dup, "hash").unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[test]
    fn lookup_by_email_returns_hash() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Grace");

        let (loaded, hash) = db.get_user_by_email(&user.email).unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(hash, "argon2-hash-placeholder");

        assert!(matches!(
            db.get_user_by_email("nobody@example.org"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn directory_lists_all_users() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "Jon");
        seed_user(&db, "Jonathan");

        let dir = db.list_directory().unwrap();
        let names: Vec<_> = dir.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["Jon", "Jonathan"]);
    }

    #[test]
    fn partial_profile_update() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "Ada");

        db.update_profile(
            user.id,
            &ProfileUpdate {
                first_name: Some("Ada".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let loaded = db.get_user(user.id).unwrap();
        assert_eq!(loaded.first_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.display_name, "Ada"); // untouched

        let err = db
            .update_profile(UserId::new(), &ProfileUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
