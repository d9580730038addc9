//! Follow / unfollow.

use tracing::debug;

use crate::service::{now_millis, ServiceError};
use crate::storage::{FollowRow, Storage, StorageError};

/// Create the edge viewer -> target.
pub fn follow(
    storage: &Storage,
    viewer_id: i64,
    target_id: i64,
) -> Result<FollowRow, ServiceError> {
    if viewer_id == target_id {
        return Err(ServiceError::Rejected(
            "You can't follow yourself".to_string(),
        ));
    }
    if !storage.has_user(target_id)? {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    let row = FollowRow {
        follower_id: viewer_id,
        following_id: target_id,
        created_at: now_millis(),
    };
    match storage.insert_follow(&row) {
        Ok(()) => {
            debug!(follower = viewer_id, following = target_id, "follow");
            Ok(row)
        }
        Err(StorageError::AlreadyExists(_)) => Err(ServiceError::Conflict(
            "Already following this user".to_string(),
        )),
        Err(StorageError::NotFound(_)) => Err(ServiceError::NotFound("User not found".to_string())),
        Err(e) => Err(e.into()),
    }
}

pub fn unfollow(storage: &Storage, viewer_id: i64, target_id: i64) -> Result<(), ServiceError> {
    if storage.delete_follow(viewer_id, target_id)? {
        debug!(follower = viewer_id, following = target_id, "unfollow");
        Ok(())
    } else {
        Err(ServiceError::NotFound("Not following this user".to_string()))
    }
}
