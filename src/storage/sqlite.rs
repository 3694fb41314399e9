//! SQLite storage implementation
//!
//! Entity operations live in sibling modules as further `impl SqliteStore`
//! blocks; this file owns the connection, schema setup and error mapping.

use super::schema::{self, OnDelete, SchemaOptions};
use crate::{Error, Result, UniqueConstraint};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

/// SQLite-backed storage for the blog schema
#[derive(Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
    pub(crate) options: SchemaOptions,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist) with default schema options
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, SchemaOptions::default())
    }

    /// Open a database file with explicit schema options.
    ///
    /// Options only shape the DDL of a fresh database. An existing database
    /// keeps the policy it was created with, and [`SqliteStore::options`]
    /// reports that policy rather than the requested one.
    pub fn open_with(path: &Path, options: SchemaOptions) -> Result<Self> {
        options.validate()?;
        let conn = Connection::open(path)?;
        let mut store = Self { conn, options };
        store.initialize_schema()?;
        tracing::info!("Opened blog database at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(SchemaOptions::default())
    }

    pub fn open_in_memory_with(options: SchemaOptions) -> Result<Self> {
        options.validate()?;
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, options };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Enable foreign keys, adopt the options of an existing schema and
    /// create any missing tables
    fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if let Some(applied) = self.applied_options()? {
            if applied != self.options {
                tracing::warn!(
                    requested = ?self.options,
                    applied = ?applied,
                    "database keeps the schema options it was created with"
                );
            }
            self.options = applied;
        }
        for stmt in schema::all_schema_statements(&self.options) {
            self.conn.execute(&stmt, [])?;
        }
        Ok(())
    }

    /// Schema options in force for this database
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Read the options baked into the DDL of an existing database.
    /// `None` when the schema has not been created yet.
    pub(crate) fn applied_options(&self) -> Result<Option<SchemaOptions>> {
        // articles is created after user_fans and blogs
        let articles: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'articles'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if articles.is_none() {
            return Ok(None);
        }

        let user_fans: String = self.conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'user_fans'",
            [],
            |row| row.get(0),
        )?;

        Ok(Some(SchemaOptions {
            owner_on_delete: self.delete_action("blogs", "user_id")?,
            category_on_delete: self.delete_action("articles", "category_id")?,
            forbid_self_follow: user_fans.contains("user_id <> follower_id"),
        }))
    }

    /// ON DELETE action declared on `table.column`
    fn delete_action(&self, table: &str, column: &str) -> Result<OnDelete> {
        let action: String = self.conn.query_row(
            "SELECT on_delete FROM pragma_foreign_key_list(?1) WHERE \"from\" = ?2",
            params![table, column],
            |row| row.get(0),
        )?;
        action
            .replace(' ', "_")
            .parse::<OnDelete>()
            .map_err(Error::InvalidOptions)
    }

    /// Run `f` inside a transaction, committing only if it succeeds
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Count rows in one table
    pub(crate) fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            users: self.count("users")?,
            user_fans: self.count("user_fans")?,
            blogs: self.count("blogs")?,
            categories: self.count("categories")?,
            tags: self.count("tags")?,
            articles: self.count("articles")?,
            article_details: self.count("article_details")?,
            article_tags: self.count("article_tags")?,
        })
    }
}

/// Map a failed write into the schema's error classes.
///
/// SQLite reports constraint failures through the message text, e.g.
/// `UNIQUE constraint failed: users.email`.
pub(crate) fn classify(entity: &'static str, err: rusqlite::Error) -> Error {
    let message = match &err {
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(message.clone())
        }
        _ => None,
    };
    let Some(message) = message else {
        return Error::Storage(err);
    };

    if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
        Error::UniqueViolation(UniqueConstraint::from_columns(columns))
    } else if message.starts_with("FOREIGN KEY constraint failed") {
        Error::ForeignKey(entity)
    } else if let Some(check) = message.strip_prefix("CHECK constraint failed: ") {
        Error::Check(check.to_string())
    } else {
        Error::Storage(err)
    }
}

/// `map_err` adapter for writes touching `entity`
pub(crate) fn write_error(entity: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |err| classify(entity, err)
}

/// Database statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DbStats {
    pub users: usize,
    pub user_fans: usize,
    pub blogs: usize,
    pub categories: usize,
    pub tags: usize,
    pub articles: usize,
    pub article_details: usize,
    pub article_tags: usize,
}

impl DbStats {
    /// (table, count) pairs in schema order
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("users", self.users),
            ("user_fans", self.user_fans),
            ("blogs", self.blogs),
            ("categories", self.categories),
            ("tags", self.tags),
            ("articles", self.articles),
            ("article_details", self.article_details),
            ("article_tags", self.article_tags),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (table, count) in self.rows() {
            writeln!(f, "  {}: {}", table, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArticleType, NewArticle, NewBlog, NewUser};

    fn user(name: &str) -> NewUser {
        NewUser::new(name, "hash", name, format!("{}@example.com", name), "avatars/x.png")
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let enabled: i64 = store
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_stats_counts_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.stats().unwrap().users, 0);

        let alice = store.create_user(&user("alice")).unwrap();
        let bob = store.create_user(&user("bob")).unwrap();
        store.follow(alice.nid, bob.nid).unwrap();
        store
            .create_blog(&NewBlog::new(alice.nid, "Alice", "alice", "default"))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.user_fans, 1);
        assert_eq!(stats.blogs, 1);
        assert_eq!(stats.articles, 0);
        assert!(stats.to_string().contains("users: 2"));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result: Result<()> = store.transaction(|s| {
            s.create_user(&user("alice"))?;
            let mut again = user("alice");
            again.email = "alice.again@example.com".into();
            s.create_user(&again)?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(Error::UniqueViolation(UniqueConstraint::Username))
        ));
        assert_eq!(store.stats().unwrap().users, 0);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let alice = store.create_user(&user("alice")).unwrap();
            let blog = store
                .create_blog(&NewBlog::new(alice.nid, "Alice", "alice", "default"))
                .unwrap();
            store
                .create_article(&NewArticle::new(blog.nid, "Hello", "First post", ArticleType::Linux))
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.blogs, 1);
        assert_eq!(stats.articles, 1);
        assert!(store.get_blog_by_site("alice").unwrap().is_some());
    }

    #[test]
    fn test_reopen_keeps_created_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");
        SqliteStore::open(&path).unwrap();

        let requested = SchemaOptions {
            owner_on_delete: OnDelete::Restrict,
            category_on_delete: OnDelete::Cascade,
            forbid_self_follow: false,
        };
        let store = SqliteStore::open_with(&path, requested).unwrap();
        assert_eq!(*store.options(), SchemaOptions::default());

        // Deletes still cascade, as the options report
        let alice = store.create_user(&user("alice")).unwrap();
        store
            .create_blog(&NewBlog::new(alice.nid, "Alice", "alice", "default"))
            .unwrap();
        store.delete_user(alice.nid).unwrap();
        assert_eq!(store.stats().unwrap().blogs, 0);

        let bob = store.create_user(&user("bob")).unwrap();
        assert!(matches!(store.follow(bob.nid, bob.nid), Err(Error::SelfFollow(_))));
    }

    #[test]
    fn test_applied_options_read_from_ddl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");
        let created = SchemaOptions {
            owner_on_delete: OnDelete::Restrict,
            category_on_delete: OnDelete::Cascade,
            forbid_self_follow: false,
        };
        let store = SqliteStore::open_with(&path, created).unwrap();
        assert_eq!(store.applied_options().unwrap(), Some(created));
        drop(store);

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(*store.options(), created);

        let defaults = SqliteStore::open_in_memory().unwrap();
        assert_eq!(defaults.applied_options().unwrap(), Some(SchemaOptions::default()));
    }

    #[test]
    fn test_classify_passes_through_non_constraint_errors() {
        let err = classify("user", rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(err.class(), None);
    }
}
