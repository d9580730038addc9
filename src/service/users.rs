//! User directory and first-login account creation.

use std::collections::HashSet;

use tracing::info;

use crate::auth::ExternalIdentity;
use crate::model::{Profile, UserCard};
use crate::service::{now_millis, ServiceError};
use crate::storage::{NewUser, Storage, StorageError, UserRow};

/// Upper bound on `name-2`, `name-3`, ... attempts for a taken handle.
const MAX_HANDLE_SUFFIX: u32 = 1000;

/// Handles shadowed by fixed routes (`/profile/me`).
const RESERVED_HANDLES: &[&str] = &["me"];

fn handle_taken(storage: &Storage, username: &str) -> Result<bool, ServiceError> {
    Ok(RESERVED_HANDLES.contains(&username) || storage.username_exists(username)?)
}

/// Build the profile projection (with counts) for a stored user.
pub fn profile_of(storage: &Storage, user: &UserRow) -> Result<Profile, ServiceError> {
    let count = storage.user_counts(user.id)?;
    Ok(Profile {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        bio: user.bio.clone(),
        avatar_url: user.avatar_url.clone(),
        count,
    })
}

/// Annotate each user with whether `viewer_id` follows them.
pub fn cards_for(
    storage: &Storage,
    viewer_id: i64,
    users: &[UserRow],
) -> Result<Vec<UserCard>, ServiceError> {
    let following: HashSet<i64> = storage.list_following_ids(viewer_id)?.into_iter().collect();
    users
        .iter()
        .map(|user| {
            Ok(UserCard {
                profile: profile_of(storage, user)?,
                is_following: following.contains(&user.id),
            })
        })
        .collect()
}

/// Everyone except the viewer, by username, with follow state.
pub fn list_users(storage: &Storage, viewer_id: i64) -> Result<Vec<UserCard>, ServiceError> {
    let users = storage.list_users_except(viewer_id)?;
    cards_for(storage, viewer_id, &users)
}

/// Resolve an external login to a local account, creating it on first
/// sight. A handle already taken by another account gets a numeric suffix.
pub fn find_or_create_from_identity(
    storage: &Storage,
    identity: &ExternalIdentity,
) -> Result<UserRow, ServiceError> {
    if let Some(user) = storage.get_user_by_github_id(&identity.provider_id)? {
        return Ok(user);
    }

    let display_name = identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&identity.username)
        .to_string();

    for n in 1..=MAX_HANDLE_SUFFIX {
        let username = if n == 1 {
            identity.username.clone()
        } else {
            format!("{}-{n}", identity.username)
        };
        if handle_taken(storage, &username)? {
            continue;
        }

        let new_user = NewUser {
            github_id: identity.provider_id.clone(),
            username,
            display_name: display_name.clone(),
            bio: identity.bio.clone(),
            avatar_url: identity.avatar_url.clone(),
        };
        match storage.insert_user(&new_user, now_millis()) {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "created account");
                return Ok(user);
            }
            Err(StorageError::AlreadyExists(_)) => {
                // Lost a race: either the same login finished first, or
                // someone grabbed the handle between check and insert.
                if let Some(user) = storage.get_user_by_github_id(&identity.provider_id)? {
                    return Ok(user);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Conflict(format!(
        "no free handle derived from {}",
        identity.username
    )))
}
