//! Optimistic like and follow state.
//!
//! Each projection flips its local state first, then runs the request; if
//! the request fails the previous state is restored and the error is
//! returned to the caller.

use crate::client::{ApiClient, ClientError};
use crate::model::{PostView, ProfileView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeProjection {
    pub liked: bool,
    pub count: u32,
}

impl LikeProjection {
    pub fn from_post(post: &PostView) -> Self {
        Self {
            liked: post.is_liked,
            count: post.count.likes,
        }
    }

    /// Flip the like, then run `request(liked_now)`. Rolls back on error.
    pub fn toggle_with<F>(&mut self, request: F) -> Result<(), ClientError>
    where
        F: FnOnce(bool) -> Result<(), ClientError>,
    {
        let before = *self;
        self.liked = !self.liked;
        self.count = if self.liked {
            self.count + 1
        } else {
            self.count.saturating_sub(1)
        };
        request(self.liked).inspect_err(|_| *self = before)
    }

    pub fn toggle(&mut self, api: &ApiClient, post_id: i64) -> Result<(), ClientError> {
        self.toggle_with(|like| {
            if like {
                api.like(post_id).map(|_| ())
            } else {
                api.unlike(post_id)
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowProjection {
    pub following: bool,
    /// Follower count of the profile being viewed.
    pub followers: u32,
}

impl FollowProjection {
    pub fn from_profile(view: &ProfileView) -> Self {
        Self {
            following: view.is_following,
            followers: view.profile.count.followers,
        }
    }

    /// Flip the follow, then run `request(following_now)`. Rolls back on error.
    pub fn toggle_with<F>(&mut self, request: F) -> Result<(), ClientError>
    where
        F: FnOnce(bool) -> Result<(), ClientError>,
    {
        let before = *self;
        self.following = !self.following;
        self.followers = if self.following {
            self.followers + 1
        } else {
            self.followers.saturating_sub(1)
        };
        request(self.following).inspect_err(|_| *self = before)
    }

    pub fn toggle(&mut self, api: &ApiClient, user_id: i64) -> Result<(), ClientError> {
        self.toggle_with(|follow| {
            if follow {
                api.follow(user_id).map(|_| ())
            } else {
                api.unfollow(user_id)
            }
        })
    }
}
