//! Route handler modules for the murmur REST API.

pub mod auth;
pub mod follows;
pub mod health;
pub mod posts;
pub mod profile;
pub mod users;
