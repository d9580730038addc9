//! Posts, replies, likes and the two timelines (feed and explore).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{AuthorSummary, FieldError, PostCounts, PostView, ReplyAuthor, ReplyContext};
use crate::service::{now_millis, ServiceError};
use crate::storage::{LikeRow, PostRow, Storage, StorageError, UserRow};

/// Maximum number of posts returned by the feed and explore timelines.
pub const FEED_LIMIT: u32 = 50;
pub const MAX_CONTENT_CHARS: usize = 500;

/// Body of `POST /posts`. Fields stay loosely typed so that a missing or
/// mistyped value becomes a field error instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<serde_json::Value>,
}

impl NewPost {
    pub fn new(content: impl Into<String>, reply_to_id: Option<i64>) -> Self {
        Self {
            content: Some(serde_json::Value::String(content.into())),
            reply_to_id: reply_to_id.map(serde_json::Value::from),
        }
    }
}

fn post_not_found() -> ServiceError {
    ServiceError::NotFound("Post not found".to_string())
}

/// Integer ids may arrive as JSON numbers or numeric strings.
fn parse_reply_to(value: &serde_json::Value) -> Result<Option<i64>, ()> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n.as_i64().map(Some).ok_or(()),
        serde_json::Value::String(s) => s.trim().parse::<i64>().map(Some).map_err(|_| ()),
        _ => Err(()),
    }
}

/// Trimmed content and parsed reply target, or every field error found.
fn validate(draft: &NewPost) -> Result<(String, Option<i64>), ServiceError> {
    let mut errors = Vec::new();

    let content = match &draft.content {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            errors.push(FieldError::new("content", "body", "Post content must be a string"));
            String::new()
        }
    };
    if content.is_empty() && errors.is_empty() {
        errors.push(FieldError::new("content", "body", "Post content is required"));
    } else if content.chars().count() > MAX_CONTENT_CHARS {
        errors.push(FieldError::new(
            "content",
            "body",
            format!("Post content must be {MAX_CONTENT_CHARS} characters or less"),
        ));
    }

    let reply_to_id = match draft.reply_to_id.as_ref().map(parse_reply_to) {
        None => None,
        Some(Ok(id)) => id,
        Some(Err(())) => {
            errors.push(FieldError::new(
                "replyToId",
                "body",
                "Reply ID must be a valid integer",
            ));
            None
        }
    };

    if errors.is_empty() {
        Ok((content, reply_to_id))
    } else {
        Err(ServiceError::Validation(errors))
    }
}

fn load_author(storage: &Storage, author_id: i64) -> Result<UserRow, ServiceError> {
    storage
        .get_user(author_id)?
        .ok_or_else(|| StorageError::NotFound(format!("author {author_id}")).into())
}

fn reply_context(storage: &Storage, parent_id: i64) -> Result<Option<ReplyContext>, ServiceError> {
    let Some(parent) = storage.get_post(parent_id)? else {
        return Ok(None);
    };
    let author = load_author(storage, parent.author_id)?;
    Ok(Some(ReplyContext {
        id: parent.id,
        content: parent.content,
        is_reply_to_deleted: parent.is_reply_to_deleted,
        author: ReplyAuthor {
            username: author.username,
            display_name: author.display_name,
        },
    }))
}

/// Full view of one post as seen by `viewer_id`, without nested replies.
fn post_view(storage: &Storage, viewer_id: i64, row: &PostRow) -> Result<PostView, ServiceError> {
    let author = load_author(storage, row.author_id)?;
    let reply_to = match row.reply_to_id {
        Some(parent_id) => reply_context(storage, parent_id)?,
        None => None,
    };
    Ok(PostView {
        id: row.id,
        content: row.content.clone(),
        author_id: row.author_id,
        reply_to_id: row.reply_to_id,
        is_reply_to_deleted: row.is_reply_to_deleted,
        created_at: row.created_at,
        author: AuthorSummary {
            id: author.id,
            username: author.username,
            display_name: author.display_name,
            avatar_url: author.avatar_url,
        },
        reply_to,
        count: PostCounts {
            likes: storage.count_likes(row.id)?,
            replies: storage.count_replies(row.id)?,
        },
        is_liked: storage.has_like(viewer_id, row.id)?,
        replies: None,
    })
}

fn views(storage: &Storage, viewer_id: i64, rows: &[PostRow]) -> Result<Vec<PostView>, ServiceError> {
    rows.iter()
        .map(|row| post_view(storage, viewer_id, row))
        .collect()
}

pub fn create_post(
    storage: &Storage,
    author_id: i64,
    draft: &NewPost,
) -> Result<PostView, ServiceError> {
    let (content, reply_to_id) = validate(draft)?;

    if let Some(parent_id) = reply_to_id {
        if !storage.has_post(parent_id)? {
            return Err(ServiceError::NotFound("Parent post not found".to_string()));
        }
    }

    let row = storage
        .insert_post(author_id, &content, reply_to_id, now_millis())
        .map_err(|e| match e {
            // Parent deleted between the check and the insert.
            StorageError::NotFound(_) => ServiceError::NotFound("Parent post not found".to_string()),
            other => other.into(),
        })?;
    debug!(post_id = row.id, author_id, reply_to = ?reply_to_id, "post created");
    post_view(storage, author_id, &row)
}

/// Posts by the viewer and by everyone they follow, newest first.
pub fn list_feed(storage: &Storage, viewer_id: i64) -> Result<Vec<PostView>, ServiceError> {
    let rows = storage.list_feed(viewer_id, FEED_LIMIT)?;
    views(storage, viewer_id, &rows)
}

/// Every post, newest first.
pub fn explore(storage: &Storage, viewer_id: i64) -> Result<Vec<PostView>, ServiceError> {
    let rows = storage.list_recent_posts(FEED_LIMIT)?;
    views(storage, viewer_id, &rows)
}

pub fn list_by_author(
    storage: &Storage,
    viewer_id: i64,
    author_id: i64,
) -> Result<Vec<PostView>, ServiceError> {
    let rows = storage.list_posts_by_author(author_id)?;
    views(storage, viewer_id, &rows)
}

/// A post with its reply context and direct replies (newest first).
pub fn get_post(storage: &Storage, viewer_id: i64, post_id: i64) -> Result<PostView, ServiceError> {
    let row = storage.get_post(post_id)?.ok_or_else(post_not_found)?;
    let mut view = post_view(storage, viewer_id, &row)?;
    let replies = storage.list_replies(post_id)?;
    view.replies = Some(views(storage, viewer_id, &replies)?);
    Ok(view)
}

/// Delete one of the viewer's own posts. Direct replies survive with
/// their reply target marked as removed.
pub fn delete_post(storage: &Storage, viewer_id: i64, post_id: i64) -> Result<(), ServiceError> {
    let row = storage.get_post(post_id)?.ok_or_else(post_not_found)?;
    if row.author_id != viewer_id {
        return Err(ServiceError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }
    if !storage.delete_post(post_id)? {
        return Err(post_not_found());
    }
    info!(post_id, author_id = viewer_id, "post deleted");
    Ok(())
}

pub fn like_post(storage: &Storage, viewer_id: i64, post_id: i64) -> Result<LikeRow, ServiceError> {
    if !storage.has_post(post_id)? {
        return Err(post_not_found());
    }
    let like = LikeRow {
        user_id: viewer_id,
        post_id,
        created_at: now_millis(),
    };
    match storage.insert_like(&like) {
        Ok(()) => Ok(like),
        Err(StorageError::AlreadyExists(_)) => Err(ServiceError::Conflict(
            "You already liked this post".to_string(),
        )),
        Err(StorageError::NotFound(_)) => Err(post_not_found()),
        Err(e) => Err(e.into()),
    }
}

pub fn unlike_post(storage: &Storage, viewer_id: i64, post_id: i64) -> Result<(), ServiceError> {
    if storage.delete_like(viewer_id, post_id)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound("Like not found".to_string()))
    }
}
