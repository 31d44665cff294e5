//! # quorum-forum
//!
//! The application layer of the Quorum forum: the auth gateway, the
//! dependency-injected [`Forum`] state object, the live event feed, and the
//! command functions the API surface calls into.
//!
//! Nothing here touches SQL directly; commands orchestrate the typed store
//! helpers, the mention engine and the notification fan-out, and emit
//! [`ForumEvent`]s for embedders that want live updates.

pub mod auth;
pub mod commands;
pub mod directory;
pub mod events;
pub mod forum;

mod error;

pub use auth::{AuthGateway, NewUser};
pub use error::{AuthError, ForumError};
pub use events::{EventBus, ForumEvent};
pub use forum::Forum;
