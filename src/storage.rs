//! SQLite storage layer for murmur.
//!
//! Owns the relational schema (users, posts, likes, follows) and exposes
//! one method per query the service layer needs. Uniqueness of likes and
//! follows is enforced by the schema itself; constraint violations surface
//! as [`StorageError::AlreadyExists`] so concurrent duplicate requests
//! resolve to a conflict instead of a second row.

use std::path::Path;

use rusqlite::{ffi, params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::UserCounts;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

/// Classify a write failure: unique/primary-key violations become
/// `AlreadyExists`, foreign-key violations become `NotFound`.
fn classify_write_error(e: rusqlite::Error, what: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return StorageError::AlreadyExists(what.to_string());
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StorageError::NotFound(format!("{what}: referenced row"));
            }
            _ => {}
        }
    }
    StorageError::Sqlite(e)
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// User row stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub github_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
}

/// Fields needed to create a user on first login.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub github_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Post row stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    /// Parent post this is a reply to. Cleared when the parent is deleted.
    pub reply_to_id: Option<i64>,
    /// Set when the parent post was deleted after this reply was written.
    pub is_reply_to_deleted: bool,
    pub created_at: i64,
}

/// Like row; one per (user, post).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRow {
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: i64,
}

/// Directed follow edge; one per ordered (follower, following) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRow {
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: i64,
}

const USER_COLUMNS: &str =
    "users.id, users.github_id, users.username, users.display_name, users.bio, users.avatar_url, users.created_at";

const POST_COLUMNS: &str =
    "posts.id, posts.author_id, posts.content, posts.reply_to_id, posts.is_reply_to_deleted, posts.created_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        github_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        bio: row.get(4)?,
        avatar_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        reply_to_id: row.get(3)?,
        is_reply_to_deleted: row.get::<_, i32>(4)? != 0,
        created_at: row.get(5)?,
    })
}

// ---------------------------------------------------------------------------
// Storage handle
// ---------------------------------------------------------------------------

/// Main storage handle wrapping a SQLite connection.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Create an in-memory database. Used by tests and throwaway servers.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                github_id       TEXT NOT NULL UNIQUE,
                username        TEXT NOT NULL UNIQUE,
                display_name    TEXT NOT NULL,
                bio             TEXT,
                avatar_url      TEXT,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS posts (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id           INTEGER NOT NULL REFERENCES users(id),
                content             TEXT NOT NULL,
                reply_to_id         INTEGER REFERENCES posts(id) ON DELETE SET NULL,
                is_reply_to_deleted INTEGER NOT NULL DEFAULT 0,
                created_at          INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_posts_author
                ON posts(author_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_posts_reply_to
                ON posts(reply_to_id);
            CREATE INDEX IF NOT EXISTS idx_posts_created
                ON posts(created_at);

            CREATE TABLE IF NOT EXISTS likes (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at  INTEGER NOT NULL,
                PRIMARY KEY (user_id, post_id)
            );

            CREATE INDEX IF NOT EXISTS idx_likes_post
                ON likes(post_id);

            CREATE TABLE IF NOT EXISTS follows (
                follower_id     INTEGER NOT NULL REFERENCES users(id),
                following_id    INTEGER NOT NULL REFERENCES users(id),
                created_at      INTEGER NOT NULL,
                PRIMARY KEY (follower_id, following_id),
                CHECK (follower_id <> following_id)
            );

            CREATE INDEX IF NOT EXISTS idx_follows_following
                ON follows(following_id);
            ",
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Insert a new user. Fails with `AlreadyExists` if the github id or
    /// username is taken.
    pub fn insert_user(&self, user: &NewUser, created_at: i64) -> Result<UserRow, StorageError> {
        self.conn
            .execute(
                "INSERT INTO users (github_id, username, display_name, bio, avatar_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.github_id,
                    user.username,
                    user.display_name,
                    user.bio,
                    user.avatar_url,
                    created_at,
                ],
            )
            .map_err(|e| classify_write_error(e, "user"))?;
        Ok(UserRow {
            id: self.conn.last_insert_rowid(),
            github_id: user.github_id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], user_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let row = self
            .conn
            .query_row(&sql, params![username], user_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn get_user_by_github_id(&self, github_id: &str) -> Result<Option<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![github_id], user_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn has_user(&self, id: i64) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Overwrite the editable profile fields of a user.
    pub fn update_user_profile(
        &self,
        id: i64,
        display_name: &str,
        bio: Option<&str>,
    ) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE users SET display_name = ?1, bio = ?2 WHERE id = ?3",
            params![display_name, bio, id],
        )?;
        Ok(affected > 0)
    }

    /// All users except `id`, ordered by username.
    pub fn list_users_except(&self, id: i64) -> Result<Vec<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id <> ?1 ORDER BY username ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], user_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn count_users(&self) -> Result<u32, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u32)
    }

    /// Post, follower and following counts for a user.
    pub fn user_counts(&self, id: i64) -> Result<UserCounts, StorageError> {
        let counts = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)",
            params![id],
            |row| {
                Ok(UserCounts {
                    posts: row.get::<_, i64>(0)? as u32,
                    followers: row.get::<_, i64>(1)? as u32,
                    following: row.get::<_, i64>(2)? as u32,
                })
            },
        )?;
        Ok(counts)
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    pub fn insert_post(
        &self,
        author_id: i64,
        content: &str,
        reply_to_id: Option<i64>,
        created_at: i64,
    ) -> Result<PostRow, StorageError> {
        self.conn
            .execute(
                "INSERT INTO posts (author_id, content, reply_to_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![author_id, content, reply_to_id, created_at],
            )
            .map_err(|e| classify_write_error(e, "post"))?;
        Ok(PostRow {
            id: self.conn.last_insert_rowid(),
            author_id,
            content: content.to_string(),
            reply_to_id,
            is_reply_to_deleted: false,
            created_at,
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>, StorageError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], post_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn has_post(&self, id: i64) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn query_posts(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<PostRow>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, post_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Posts by `user_id` or by anyone `user_id` follows, newest first.
    pub fn list_feed(&self, user_id: i64, limit: u32) -> Result<Vec<PostRow>, StorageError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE posts.author_id = ?1
                OR posts.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)
             ORDER BY posts.created_at DESC, posts.id DESC
             LIMIT ?2"
        );
        self.query_posts(&sql, &[&user_id, &(limit as i64)])
    }

    /// Every post, newest first.
    pub fn list_recent_posts(&self, limit: u32) -> Result<Vec<PostRow>, StorageError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             ORDER BY posts.created_at DESC, posts.id DESC
             LIMIT ?1"
        );
        self.query_posts(&sql, &[&(limit as i64)])
    }

    pub fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<PostRow>, StorageError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE posts.author_id = ?1
             ORDER BY posts.created_at DESC, posts.id DESC"
        );
        self.query_posts(&sql, &[&author_id])
    }

    /// Direct replies to a post, newest first.
    pub fn list_replies(&self, parent_id: i64) -> Result<Vec<PostRow>, StorageError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE posts.reply_to_id = ?1
             ORDER BY posts.created_at DESC, posts.id DESC"
        );
        self.query_posts(&sql, &[&parent_id])
    }

    pub fn count_replies(&self, parent_id: i64) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE reply_to_id = ?1",
            params![parent_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn count_posts(&self) -> Result<u32, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u32)
    }

    /// Delete a post in one transaction: flag its direct replies as
    /// orphaned, drop its likes, then remove the row. Returns `false` when
    /// the post does not exist (nothing is written).
    pub fn delete_post(&self, id: i64) -> Result<bool, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let flagged = tx.execute(
            "UPDATE posts SET is_reply_to_deleted = 1, reply_to_id = NULL WHERE reply_to_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM likes WHERE post_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        if deleted == 0 {
            tx.rollback()?;
            return Ok(false);
        }
        tx.commit()?;
        debug!(post_id = id, flagged_replies = flagged, "post deleted");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    /// Insert a like. A second like for the same pair is `AlreadyExists`.
    pub fn insert_like(&self, row: &LikeRow) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
                params![row.user_id, row.post_id, row.created_at],
            )
            .map_err(|e| classify_write_error(e, "like"))?;
        Ok(())
    }

    pub fn delete_like(&self, user_id: i64, post_id: i64) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
        )?;
        Ok(affected > 0)
    }

    pub fn has_like(&self, user_id: i64, post_id: i64) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count_likes(&self, post_id: i64) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    // -----------------------------------------------------------------------
    // Follows
    // -----------------------------------------------------------------------

    /// Insert a follow edge. A repeated edge is `AlreadyExists`.
    pub fn insert_follow(&self, row: &FollowRow) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
                params![row.follower_id, row.following_id, row.created_at],
            )
            .map_err(|e| classify_write_error(e, "follow"))?;
        Ok(())
    }

    pub fn delete_follow(&self, follower_id: i64, following_id: i64) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        Ok(affected > 0)
    }

    pub fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Ids of every account `follower_id` follows.
    pub fn list_following_ids(&self, follower_id: i64) -> Result<Vec<i64>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT following_id FROM follows WHERE follower_id = ?1")?;
        let rows = stmt.query_map(params![follower_id], |row| row.get(0))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Users following `user_id`, most recent follow first.
    pub fn list_followers(&self, user_id: i64) -> Result<Vec<UserRow>, StorageError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM follows
             JOIN users ON users.id = follows.follower_id
             WHERE follows.following_id = ?1
             ORDER BY follows.created_at DESC, users.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], user_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Users `user_id` follows, most recent follow first.
    pub fn list_following(&self, user_id: i64) -> Result<Vec<UserRow>, StorageError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM follows
             JOIN users ON users.id = follows.following_id
             WHERE follows.follower_id = ?1
             ORDER BY follows.created_at DESC, users.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], user_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn new_user(storage: &Storage, name: &str) -> UserRow {
        storage
            .insert_user(
                &NewUser {
                    github_id: format!("gh-{name}"),
                    username: name.to_string(),
                    display_name: name.to_uppercase(),
                    bio: None,
                    avatar_url: None,
                },
                1_000,
            )
            .unwrap()
    }

    #[test]
    fn test_schema_creation_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("murmur.db");
        {
            let storage = Storage::open(&path).unwrap();
            new_user(&storage, "alice");
        }
        // Reopening runs the schema again and keeps existing rows.
        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.count_users().unwrap(), 1);
    }

    #[test]
    fn test_user_crud() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");

        let loaded = storage.get_user(alice.id).unwrap().unwrap();
        assert_eq!(loaded, alice);
        assert_eq!(
            storage.get_user_by_username("alice").unwrap().unwrap().id,
            alice.id
        );
        assert_eq!(
            storage.get_user_by_github_id("gh-alice").unwrap().unwrap().id,
            alice.id
        );
        assert!(storage.get_user(999).unwrap().is_none());
        assert!(storage.username_exists("alice").unwrap());
        assert!(!storage.username_exists("bob").unwrap());

        assert!(storage
            .update_user_profile(alice.id, "Alice L.", Some("hello"))
            .unwrap());
        let loaded = storage.get_user(alice.id).unwrap().unwrap();
        assert_eq!(loaded.display_name, "Alice L.");
        assert_eq!(loaded.bio.as_deref(), Some("hello"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let storage = test_storage();
        new_user(&storage, "alice");
        let err = storage
            .insert_user(
                &NewUser {
                    github_id: "gh-other".to_string(),
                    username: "alice".to_string(),
                    display_name: "Impostor".to_string(),
                    bio: None,
                    avatar_url: None,
                },
                2_000,
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_list_users_except_orders_by_username() {
        let storage = test_storage();
        let carol = new_user(&storage, "carol");
        new_user(&storage, "bob");
        new_user(&storage, "alice");

        let users = storage.list_users_except(carol.id).unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_feed_contains_self_and_followed_only() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let bob = new_user(&storage, "bob");
        let carol = new_user(&storage, "carol");

        storage
            .insert_follow(&FollowRow {
                follower_id: alice.id,
                following_id: bob.id,
                created_at: 1,
            })
            .unwrap();

        let own = storage.insert_post(alice.id, "mine", None, 10).unwrap();
        let followed = storage.insert_post(bob.id, "bob's", None, 20).unwrap();
        storage.insert_post(carol.id, "stranger", None, 30).unwrap();

        let feed = storage.list_feed(alice.id, 50).unwrap();
        let ids: Vec<i64> = feed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![followed.id, own.id]);

        let explore = storage.list_recent_posts(2).unwrap();
        assert_eq!(explore.len(), 2);
        assert_eq!(explore[0].content, "stranger");
    }

    #[test]
    fn test_same_timestamp_breaks_ties_by_id() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let first = storage.insert_post(alice.id, "first", None, 5).unwrap();
        let second = storage.insert_post(alice.id, "second", None, 5).unwrap();

        let posts = storage.list_posts_by_author(alice.id).unwrap();
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);
    }

    #[test]
    fn test_delete_post_flags_replies() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let bob = new_user(&storage, "bob");

        let parent = storage.insert_post(alice.id, "parent", None, 1).unwrap();
        let reply = storage
            .insert_post(bob.id, "reply", Some(parent.id), 2)
            .unwrap();
        storage
            .insert_like(&LikeRow {
                user_id: bob.id,
                post_id: parent.id,
                created_at: 3,
            })
            .unwrap();

        assert_eq!(storage.count_replies(parent.id).unwrap(), 1);
        assert!(storage.delete_post(parent.id).unwrap());

        assert!(storage.get_post(parent.id).unwrap().is_none());
        let reply = storage.get_post(reply.id).unwrap().unwrap();
        assert!(reply.is_reply_to_deleted);
        assert_eq!(reply.reply_to_id, None);
        assert_eq!(storage.count_likes(parent.id).unwrap(), 0);

        // Deleting again reports absence without touching anything.
        assert!(!storage.delete_post(parent.id).unwrap());
    }

    #[test]
    fn test_like_uniqueness() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let post = storage.insert_post(alice.id, "hello", None, 1).unwrap();
        let like = LikeRow {
            user_id: alice.id,
            post_id: post.id,
            created_at: 2,
        };

        storage.insert_like(&like).unwrap();
        assert!(storage.has_like(alice.id, post.id).unwrap());
        assert!(matches!(
            storage.insert_like(&like).unwrap_err(),
            StorageError::AlreadyExists(_)
        ));
        assert_eq!(storage.count_likes(post.id).unwrap(), 1);

        assert!(storage.delete_like(alice.id, post.id).unwrap());
        assert!(!storage.delete_like(alice.id, post.id).unwrap());
    }

    #[test]
    fn test_like_on_missing_post_is_not_found() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let err = storage
            .insert_like(&LikeRow {
                user_id: alice.id,
                post_id: 42,
                created_at: 1,
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_follow_edges_and_counts() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let bob = new_user(&storage, "bob");
        let carol = new_user(&storage, "carol");

        let edge = FollowRow {
            follower_id: alice.id,
            following_id: bob.id,
            created_at: 1,
        };
        storage.insert_follow(&edge).unwrap();
        assert!(matches!(
            storage.insert_follow(&edge).unwrap_err(),
            StorageError::AlreadyExists(_)
        ));
        storage
            .insert_follow(&FollowRow {
                follower_id: carol.id,
                following_id: bob.id,
                created_at: 2,
            })
            .unwrap();
        storage.insert_post(bob.id, "hi", None, 3).unwrap();

        let counts = storage.user_counts(bob.id).unwrap();
        assert_eq!(
            counts,
            UserCounts {
                posts: 1,
                followers: 2,
                following: 0
            }
        );

        let followers = storage.list_followers(bob.id).unwrap();
        assert_eq!(followers[0].username, "carol");
        assert_eq!(followers[1].username, "alice");
        assert_eq!(storage.list_following(alice.id).unwrap()[0].id, bob.id);
        assert_eq!(storage.list_following_ids(alice.id).unwrap(), vec![bob.id]);

        assert!(storage.delete_follow(alice.id, bob.id).unwrap());
        assert!(!storage.is_following(alice.id, bob.id).unwrap());
        assert!(!storage.delete_follow(alice.id, bob.id).unwrap());
    }

    #[test]
    fn test_self_follow_rejected_by_schema() {
        let storage = test_storage();
        let alice = new_user(&storage, "alice");
        let err = storage
            .insert_follow(&FollowRow {
                follower_id: alice.id,
                following_id: alice.id,
                created_at: 1,
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
