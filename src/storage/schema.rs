//! Database schema definitions
//!
//! Length limits come from [`crate::fields`] so the storage CHECKs and the
//! Rust-side validation never disagree.

use crate::fields::*;
use serde::{Deserialize, Serialize};

/// ON DELETE action for a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

impl std::str::FromStr for OnDelete {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cascade" => Ok(OnDelete::Cascade),
            "set_null" | "null" => Ok(OnDelete::SetNull),
            "restrict" => Ok(OnDelete::Restrict),
            _ => Err(format!("Unknown delete policy: {} (expected cascade, set_null or restrict)", s)),
        }
    }
}

/// Options fixed into the DDL when a database is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Applied to every owning reference (blog -> user, article -> blog, ...)
    pub owner_on_delete: OnDelete,
    /// Applied to article -> category
    pub category_on_delete: OnDelete,
    /// Reject rows where a user follows themselves
    pub forbid_self_follow: bool,
}

impl SchemaOptions {
    /// Owning references are NOT NULL, so they cannot use `SET NULL`
    pub fn validate(&self) -> crate::Result<()> {
        if self.owner_on_delete == OnDelete::SetNull {
            return Err(crate::Error::InvalidOptions(
                "owner_on_delete cannot be set_null: owning references are required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            owner_on_delete: OnDelete::Cascade,
            category_on_delete: OnDelete::SetNull,
            forbid_self_follow: true,
        }
    }
}

/// Names of all tables, parents first
pub const TABLES: &[&str] = &[
    "users",
    "user_fans",
    "blogs",
    "categories",
    "tags",
    "articles",
    "article_details",
    "article_tags",
];

fn create_users_table() -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS users (
    nid INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE CHECK (length(username) BETWEEN 1 AND {USERNAME_MAX}),
    password TEXT NOT NULL CHECK (length(password) BETWEEN 1 AND {PASSWORD_MAX}),
    nickname TEXT NOT NULL CHECK (length(nickname) BETWEEN 1 AND {NICKNAME_MAX}),
    email TEXT NOT NULL UNIQUE CHECK (length(email) BETWEEN 1 AND {EMAIL_MAX}),
    avatar TEXT NOT NULL CHECK (length(avatar) BETWEEN 1 AND {AVATAR_MAX}),
    create_time TEXT NOT NULL
)
"#
    )
}

fn create_user_fans_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    let self_follow = if options.forbid_self_follow {
        ",\n    CHECK (user_id <> follower_id)"
    } else {
        ""
    };
    format!(
        r#"
CREATE TABLE IF NOT EXISTS user_fans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(nid) ON DELETE {on_delete},
    follower_id INTEGER NOT NULL REFERENCES users(nid) ON DELETE {on_delete},
    UNIQUE(user_id, follower_id){self_follow}
)
"#
    )
}

fn create_blogs_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS blogs (
    nid INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND {BLOG_TITLE_MAX}),
    site TEXT NOT NULL UNIQUE CHECK (length(site) BETWEEN 1 AND {SITE_MAX}),
    theme TEXT NOT NULL CHECK (length(theme) BETWEEN 1 AND {THEME_MAX}),
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(nid) ON DELETE {on_delete}
)
"#
    )
}

fn create_categories_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS categories (
    nid INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND {CATEGORY_TITLE_MAX}),
    blog_id INTEGER NOT NULL REFERENCES blogs(nid) ON DELETE {on_delete}
)
"#
    )
}

fn create_tags_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS tags (
    nid INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND {TAG_TITLE_MAX}),
    blog_id INTEGER NOT NULL REFERENCES blogs(nid) ON DELETE {on_delete}
)
"#
    )
}

fn create_articles_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    let category_on_delete = options.category_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS articles (
    nid INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND {ARTICLE_TITLE_MAX}),
    summary TEXT NOT NULL CHECK (length(summary) BETWEEN 1 AND {SUMMARY_MAX}),
    read_count INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    up_count INTEGER NOT NULL DEFAULT 0,
    down_count INTEGER NOT NULL DEFAULT 0,
    create_time TEXT NOT NULL,
    blog_id INTEGER NOT NULL REFERENCES blogs(nid) ON DELETE {on_delete},
    category_id INTEGER REFERENCES categories(nid) ON DELETE {category_on_delete},
    article_type INTEGER NOT NULL CHECK (article_type IN (1, 2, 3, 4))
)
"#
    )
}

fn create_article_details_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS article_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL CHECK (length(content) > 0),
    article_id INTEGER NOT NULL UNIQUE REFERENCES articles(nid) ON DELETE {on_delete}
)
"#
    )
}

fn create_article_tags_table(options: &SchemaOptions) -> String {
    let on_delete = options.owner_on_delete.as_sql();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS article_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES articles(nid) ON DELETE {on_delete},
    tag_id INTEGER NOT NULL REFERENCES tags(nid) ON DELETE {on_delete},
    UNIQUE(article_id, tag_id)
)
"#
    )
}

/// SQL to create indexes on foreign-key columns
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_user_fans_follower ON user_fans(follower_id)",
    "CREATE INDEX IF NOT EXISTS idx_categories_blog ON categories(blog_id)",
    "CREATE INDEX IF NOT EXISTS idx_tags_blog ON tags(blog_id)",
    "CREATE INDEX IF NOT EXISTS idx_articles_blog ON articles(blog_id)",
    "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_article_tags_tag ON article_tags(tag_id)",
];

/// All schema creation statements
pub fn all_schema_statements(options: &SchemaOptions) -> Vec<String> {
    let mut stmts = vec![
        create_users_table(),
        create_user_fans_table(options),
        create_blogs_table(options),
        create_categories_table(options),
        create_tags_table(options),
        create_articles_table(options),
        create_article_details_table(options),
        create_article_tags_table(options),
    ];
    stmts.extend(CREATE_INDEXES.iter().map(|s| s.to_string()));
    stmts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_cover_every_table() {
        let stmts = all_schema_statements(&SchemaOptions::default());
        for table in TABLES {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(stmts.iter().any(|s| s.contains(&needle)), "missing {}", table);
        }
    }

    #[test]
    fn test_self_follow_check_follows_option() {
        let strict = create_user_fans_table(&SchemaOptions::default());
        assert!(strict.contains("CHECK (user_id <> follower_id)"));

        let lenient = create_user_fans_table(&SchemaOptions {
            forbid_self_follow: false,
            ..Default::default()
        });
        assert!(!lenient.contains("<>"));
    }

    #[test]
    fn test_on_delete_policies() {
        let options = SchemaOptions {
            owner_on_delete: OnDelete::Restrict,
            category_on_delete: OnDelete::Cascade,
            forbid_self_follow: true,
        };
        let articles = create_articles_table(&options);
        assert!(articles.contains("REFERENCES blogs(nid) ON DELETE RESTRICT"));
        assert!(articles.contains("REFERENCES categories(nid) ON DELETE CASCADE"));

        let defaults = create_articles_table(&SchemaOptions::default());
        assert!(defaults.contains("REFERENCES categories(nid) ON DELETE SET NULL"));
    }

    #[test]
    fn test_parse_on_delete() {
        assert_eq!("cascade".parse::<OnDelete>().unwrap(), OnDelete::Cascade);
        assert_eq!("set-null".parse::<OnDelete>().unwrap(), OnDelete::SetNull);
        assert_eq!("RESTRICT".parse::<OnDelete>().unwrap(), OnDelete::Restrict);
        assert!("nothing".parse::<OnDelete>().is_err());
    }

    #[test]
    fn test_owner_policy_cannot_set_null() {
        assert!(SchemaOptions::default().validate().is_ok());
        let options = SchemaOptions {
            owner_on_delete: OnDelete::SetNull,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
