//! # quorum-store
//!
//! SQLite-backed storage for the Quorum forum.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Every multi-document invariant — cached vote and answer counts,
//! reputation adjustments, cascading deletes, notification fan-out — is
//! maintained inside a single SQLite transaction, so observers never see a
//! half-applied state.

pub mod answers;
pub mod database;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod questions;
pub mod replies;
pub mod users;
pub mod votes;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use users::ProfileUpdate;
pub use votes::VoteOutcome;
