//! # blogdb - Blogging platform schema
//!
//! Storage schema for a multi-tenant blogging platform, enforced on SQLite.
//!
//! blogdb provides:
//! - Typed entities: users, fans, blogs, categories, tags, articles, article bodies
//! - DDL with unique, foreign-key and length constraints
//! - A store issuing create/read/update/delete calls for every entity
//! - Translation of storage failures into uniqueness and integrity errors
//! - An audit of invariants the storage layer cannot enforce alone

pub mod fields;
pub mod user;
pub mod blog;
pub mod article;
pub mod storage;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use article::{Article, Article2Tag, ArticleCounter, ArticleDetail, ArticleType, ArticleUpdate, NewArticle};
pub use blog::{Blog, BlogUpdate, Category, NewBlog, NewCategory, NewTag, Tag};
pub use storage::{AuditReport, DbStats, OnDelete, SchemaOptions, SqliteStore};
pub use user::{NewUser, User, UserFans, UserUpdate};

/// Result type alias for blogdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unique constraints declared by the schema.
///
/// SQLite stops at the first violated constraint, so a row breaking
/// several of them reports only one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// users.username
    Username,
    /// users.email
    Email,
    /// blogs.site
    Site,
    /// blogs.user_id - one blog per user
    BlogOwner,
    /// (user_fans.user_id, user_fans.follower_id)
    Follow,
    /// article_details.article_id - one body per article
    ArticleDetail,
    /// (article_tags.article_id, article_tags.tag_id)
    ArticleTag,
    /// Columns reported by SQLite that map to none of the above
    Other(String),
}

impl UniqueConstraint {
    /// Map the column list of a SQLite `UNIQUE constraint failed: ...` message
    pub fn from_columns(columns: &str) -> Self {
        match columns.trim() {
            "users.username" => UniqueConstraint::Username,
            "users.email" => UniqueConstraint::Email,
            "blogs.site" => UniqueConstraint::Site,
            "blogs.user_id" => UniqueConstraint::BlogOwner,
            "user_fans.user_id, user_fans.follower_id" => UniqueConstraint::Follow,
            "article_details.article_id" => UniqueConstraint::ArticleDetail,
            "article_tags.article_id, article_tags.tag_id" => UniqueConstraint::ArticleTag,
            other => UniqueConstraint::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueConstraint::Username => write!(f, "username"),
            UniqueConstraint::Email => write!(f, "email"),
            UniqueConstraint::Site => write!(f, "blog site"),
            UniqueConstraint::BlogOwner => write!(f, "blog owner"),
            UniqueConstraint::Follow => write!(f, "follower pair"),
            UniqueConstraint::ArticleDetail => write!(f, "article detail"),
            UniqueConstraint::ArticleTag => write!(f, "article-tag pair"),
            UniqueConstraint::Other(columns) => write!(f, "{}", columns),
        }
    }
}

/// The two classes of failure the schema reports to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// An insert or update would break a unique constraint
    Uniqueness,
    /// A reference points nowhere, or a field is absent, oversized or malformed
    Integrity,
}

/// Error types for blogdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate {0}")]
    UniqueViolation(UniqueConstraint),

    #[error("Foreign key constraint failed writing {0}")]
    ForeignKey(&'static str),

    #[error("Missing required field {entity}.{field}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Field {entity}.{field} is {actual} characters long (max {max})")]
    FieldTooLong {
        entity: &'static str,
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid site slug: {0}")]
    InvalidSite(String),

    #[error("Unknown article type: {0}")]
    UnknownArticleType(String),

    #[error("User {0} cannot follow themselves")]
    SelfFollow(i64),

    #[error("{entity} {id} belongs to blog {found}, not blog {expected}")]
    CrossBlog {
        entity: &'static str,
        id: i64,
        expected: i64,
        found: i64,
    },

    #[error("Counter {counter} of article {article} would overflow")]
    CounterOverflow {
        article: i64,
        counter: &'static str,
    },

    #[error("Check constraint failed: {0}")]
    Check(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid schema options: {0}")]
    InvalidOptions(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Which schema failure class this error belongs to, if any.
    ///
    /// Storage, IO and option errors are environmental and return `None`.
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            Error::UniqueViolation(_) => Some(FailureClass::Uniqueness),
            Error::Storage(_) | Error::Io(_) | Error::InvalidOptions(_) => None,
            _ => Some(FailureClass::Integrity),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::UniqueViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_constraint_from_columns() {
        assert_eq!(UniqueConstraint::from_columns("users.username"), UniqueConstraint::Username);
        assert_eq!(
            UniqueConstraint::from_columns("article_tags.article_id, article_tags.tag_id"),
            UniqueConstraint::ArticleTag
        );
        assert_eq!(
            UniqueConstraint::from_columns("foo.bar"),
            UniqueConstraint::Other("foo.bar".to_string())
        );
    }

    #[test]
    fn test_failure_class() {
        assert_eq!(
            Error::UniqueViolation(UniqueConstraint::Site).class(),
            Some(FailureClass::Uniqueness)
        );
        assert_eq!(Error::ForeignKey("article").class(), Some(FailureClass::Integrity));
        assert_eq!(
            Error::CounterOverflow { article: 1, counter: "read_count" }.class(),
            Some(FailureClass::Integrity)
        );
        assert_eq!(
            Error::FieldTooLong { entity: "blog", field: "site", max: 32, actual: 40 }.class(),
            Some(FailureClass::Integrity)
        );
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.class(), None);
    }
}
