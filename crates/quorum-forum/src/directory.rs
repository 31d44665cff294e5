//! The cached user directory the mention engine resolves against.
//!
//! Fetched once and reused for the rest of the editing session; a stale
//! snapshot only means a brand-new user is not yet mentionable, which is
//! acceptable for a convenience feature. [`DirectoryCache::invalidate`] is
//! called whenever a display name changes or an account is created.

use std::sync::{Arc, RwLock};

use quorum_shared::DirectoryEntry;
use quorum_store::{Database, StoreError};

#[derive(Default)]
pub struct DirectoryCache {
    entries: RwLock<Option<Arc<Vec<DirectoryEntry>>>>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot, loading it from the store on first use.
    pub fn get_or_load(&self, db: &Database) -> Result<Arc<Vec<DirectoryEntry>>, StoreError> {
        if let Some(cached) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return Ok(Arc::clone(cached));
        }
        self.refresh(db)
    }

    /// Reload the snapshot from the store.
    pub fn refresh(&self, db: &Database) -> Result<Arc<Vec<DirectoryEntry>>, StoreError> {
        let fresh = Arc::new(db.list_directory()?);
        tracing::debug!(users = fresh.len(), "user directory refreshed");
        *self.entries.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Drop the snapshot so the next read reloads.
    pub fn invalidate(&self) {
        *self.entries.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
