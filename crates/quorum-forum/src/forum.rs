//! The central application state object.
//!
//! The original product kept the signed-in user, the viewed question and the
//! directory cache in module-level globals. [`Forum`] replaces those with one
//! explicit, injectable value: the database handle, the directory cache, the
//! event bus and the auth gateway, shared behind `Arc` by every caller.

use std::sync::{Mutex, MutexGuard};

use quorum_shared::UserId;
use quorum_store::{Database, User};

use crate::auth::{AuthGateway, NewUser};
use crate::directory::DirectoryCache;
use crate::error::Result;
use crate::events::EventBus;

pub struct Forum {
    db: Mutex<Database>,
    directory: DirectoryCache,
    events: EventBus,
    auth: AuthGateway,
}

impl Forum {
    pub fn new(db: Database, auth: AuthGateway) -> Self {
        Self {
            db: Mutex::new(db),
            directory: DirectoryCache::new(),
            events: EventBus::default(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthGateway {
        &self.auth
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn directory(&self) -> &DirectoryCache {
        &self.directory
    }

    /// Create an account. A new user is immediately mentionable, so the
    /// directory cache is invalidated.
    pub fn sign_up(&self, input: NewUser) -> Result<User> {
        let user = self.auth.sign_up(&self.db(), input)?;
        self.directory.invalidate();
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<(User, String)> {
        self.auth.sign_in(&self.db(), email, password)
    }

    /// Resolve a verified token id to the full user record.
    pub fn user(&self, id: UserId) -> Result<User> {
        Ok(self.db().get_user(id)?)
    }

    /// Lock the database handle. SQLite work is short and synchronous, so
    /// a plain mutex is enough; a poisoned lock still yields the guard.
    pub(crate) fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}
