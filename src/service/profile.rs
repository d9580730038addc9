//! Own-profile read/edit and public profile lookups by handle.

use serde::{Deserialize, Serialize};

use crate::model::{FieldError, Profile, ProfileView, UserCard};
use crate::service::users::{cards_for, profile_of};
use crate::service::ServiceError;
use crate::storage::{Storage, UserRow};

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 160;

/// Partial profile update. Absent fields are left unchanged; an empty bio
/// clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}

fn require_user(storage: &Storage, id: i64) -> Result<UserRow, ServiceError> {
    storage.get_user(id)?.ok_or_else(user_not_found)
}

fn require_handle(storage: &Storage, username: &str) -> Result<UserRow, ServiceError> {
    storage
        .get_user_by_username(username)?
        .ok_or_else(user_not_found)
}

pub fn get_own_profile(storage: &Storage, viewer_id: i64) -> Result<Profile, ServiceError> {
    let user = require_user(storage, viewer_id)?;
    profile_of(storage, &user)
}

pub fn update_own_profile(
    storage: &Storage,
    viewer_id: i64,
    patch: &ProfilePatch,
) -> Result<Profile, ServiceError> {
    let user = require_user(storage, viewer_id)?;
    let mut errors = Vec::new();

    let display_name = match patch.display_name.as_deref().map(str::trim) {
        None => user.display_name.clone(),
        Some("") => {
            errors.push(FieldError::new(
                "displayName",
                "body",
                "Display name cannot be empty",
            ));
            user.display_name.clone()
        }
        Some(name) if name.chars().count() > MAX_DISPLAY_NAME_CHARS => {
            errors.push(FieldError::new(
                "displayName",
                "body",
                format!("Display name must be {MAX_DISPLAY_NAME_CHARS} characters or less"),
            ));
            user.display_name.clone()
        }
        Some(name) => name.to_string(),
    };

    let bio = match patch.bio.as_deref().map(str::trim) {
        None => user.bio.clone(),
        Some("") => None,
        Some(bio) if bio.chars().count() > MAX_BIO_CHARS => {
            errors.push(FieldError::new(
                "bio",
                "body",
                format!("Bio must be {MAX_BIO_CHARS} characters or less"),
            ));
            user.bio.clone()
        }
        Some(bio) => Some(bio.to_string()),
    };

    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    storage.update_user_profile(viewer_id, &display_name, bio.as_deref())?;
    get_own_profile(storage, viewer_id)
}

/// Profile of `username` as seen by the viewer.
pub fn get_profile_by_username(
    storage: &Storage,
    viewer_id: i64,
    username: &str,
) -> Result<ProfileView, ServiceError> {
    let subject = require_handle(storage, username)?;
    let is_own_profile = subject.id == viewer_id;
    let (is_following, follows_you) = if is_own_profile {
        (false, false)
    } else {
        (
            storage.is_following(viewer_id, subject.id)?,
            storage.is_following(subject.id, viewer_id)?,
        )
    };
    Ok(ProfileView {
        profile: profile_of(storage, &subject)?,
        is_following,
        follows_you,
        is_own_profile,
    })
}

pub fn list_followers(
    storage: &Storage,
    viewer_id: i64,
    username: &str,
) -> Result<Vec<UserCard>, ServiceError> {
    let subject = require_handle(storage, username)?;
    let users = storage.list_followers(subject.id)?;
    cards_for(storage, viewer_id, &users)
}

pub fn list_following(
    storage: &Storage,
    viewer_id: i64,
    username: &str,
) -> Result<Vec<UserCard>, ServiceError> {
    let subject = require_handle(storage, username)?;
    let users = storage.list_following(subject.id)?;
    cards_for(storage, viewer_id, &users)
}
