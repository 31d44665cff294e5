use serde::Deserialize;
use tracing::info;

use quorum_shared::constants::MAX_TITLE_LEN;
use quorum_shared::UserId;
use quorum_store::{ProfileUpdate, User};

use crate::commands::required_text;
use crate::error::Result;
use crate::forum::Forum;

/// Editable profile fields. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditProfile {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Public profile view: the stats card on the profile page.
pub fn get_profile(forum: &Forum, id: UserId) -> Result<User> {
    forum.user(id)
}

/// Update the caller's own profile. A changed display name invalidates the
/// mention directory so new posts resolve against the fresh name.
pub fn update_profile(forum: &Forum, user: &User, edit: EditProfile) -> Result<User> {
    let display_name = edit
        .display_name
        .as_deref()
        .map(|name| required_text(name, "display name", MAX_TITLE_LEN))
        .transpose()?;

    let update = ProfileUpdate {
        display_name,
        first_name: edit.first_name,
        last_name: edit.last_name,
        photo_url: edit.photo_url,
    };

    {
        let db = forum.db();
        db.update_profile(user.id, &update)?;
    }

    if update.display_name.is_some() {
        forum.directory().invalidate();
    }

    info!(user = %user.id, "profile updated");
    forum.user(user.id)
}
