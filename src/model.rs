//! JSON views exchanged over the REST API.
//!
//! The server builds these from storage rows; the client data layer
//! deserializes the same types, so both sides agree on the wire shape.
//! Keys are camelCase and aggregate counts live under `_count`.

use serde::{Deserialize, Serialize};

/// Aggregate counts shown on profiles and user cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub posts: u32,
    pub followers: u32,
    pub following: u32,
}

/// Like and reply totals for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounts {
    pub likes: u32,
    pub replies: u32,
}

/// Author projection embedded in every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyAuthor {
    pub username: String,
    pub display_name: String,
}

/// The post a reply points at, trimmed to what a thread header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyContext {
    pub id: i64,
    pub content: String,
    pub is_reply_to_deleted: bool,
    pub author: ReplyAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub reply_to_id: Option<i64>,
    /// True when the post this replied to has been deleted. `reply_to`
    /// is then `None` and clients show a "deleted post" marker instead.
    pub is_reply_to_deleted: bool,
    pub created_at: i64,
    pub author: AuthorSummary,
    pub reply_to: Option<ReplyContext>,
    #[serde(rename = "_count")]
    pub count: PostCounts,
    pub is_liked: bool,
    /// Only populated on the single-post (thread) view, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<PostView>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(rename = "_count")]
    pub count: UserCounts,
}

/// A profile seen by another user, with the relationship between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    /// Viewer follows this user.
    pub is_following: bool,
    /// This user follows the viewer.
    pub follows_you: bool,
    pub is_own_profile: bool,
}

/// Entry in the user directory and follower/following lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    #[serde(flatten)]
    pub profile: Profile,
    pub is_following: bool,
}

/// One entry of a validation failure body: `{ "errors": [FieldError] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    /// Where the field came from: "body", "params" or "query".
    pub location: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            location: location.into(),
            message: message.into(),
        }
    }
}
