//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - users(nid, username, password, nickname, email, avatar, create_time)
//! - user_fans(id, user_id, follower_id)
//! - blogs(nid, title, site, theme, user_id)
//! - categories(nid, title, blog_id), tags(nid, title, blog_id)
//! - articles(nid, title, summary, counters, create_time, blog_id, category_id, article_type)
//! - article_details(id, content, article_id)
//! - article_tags(id, article_id, tag_id)

pub mod schema;
pub mod sqlite;
mod users;
mod blogs;
mod articles;
mod audit;

pub use audit::AuditReport;
pub use schema::{OnDelete, SchemaOptions};
pub use sqlite::{DbStats, SqliteStore};
