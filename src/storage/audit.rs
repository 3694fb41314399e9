//! Invariants the DDL does not enforce by itself

use super::sqlite::SqliteStore;
use crate::user::UserFans;
use crate::Result;
use serde::Serialize;

/// Rows breaking an invariant the storage layer cannot express
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// user_fans rows where a user follows themselves
    pub self_follows: Vec<UserFans>,
    /// Articles whose category belongs to another blog
    pub cross_blog_categories: Vec<i64>,
    /// (article, tag) links whose tag belongs to another blog
    pub cross_blog_tags: Vec<(i64, i64)>,
    /// Articles with no body row
    pub articles_without_detail: Vec<i64>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.self_follows.is_empty()
            && self.cross_blog_categories.is_empty()
            && self.cross_blog_tags.is_empty()
            && self.articles_without_detail.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        self.self_follows.len()
            + self.cross_blog_categories.len()
            + self.cross_blog_tags.len()
            + self.articles_without_detail.len()
    }
}

impl SqliteStore {
    /// Scan for self-follows, cross-blog references and missing bodies
    pub fn audit(&self) -> Result<AuditReport> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, user_id, follower_id FROM user_fans WHERE user_id = follower_id ORDER BY id")?;
        let self_follows = stmt
            .query_map([], |row| {
                Ok(UserFans {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    follower_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let cross_blog_categories = self.audit_ids(
            r#"
            SELECT a.nid FROM articles a
            JOIN categories c ON c.nid = a.category_id
            WHERE c.blog_id <> a.blog_id
            ORDER BY a.nid
            "#,
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT l.article_id, l.tag_id FROM article_tags l
            JOIN articles a ON a.nid = l.article_id
            JOIN tags t ON t.nid = l.tag_id
            WHERE a.blog_id <> t.blog_id
            ORDER BY l.id
            "#,
        )?;
        let cross_blog_tags = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let articles_without_detail = self.audit_ids(
            r#"
            SELECT a.nid FROM articles a
            LEFT JOIN article_details d ON d.article_id = a.nid
            WHERE d.id IS NULL
            ORDER BY a.nid
            "#,
        )?;

        let report = AuditReport {
            self_follows,
            cross_blog_categories,
            cross_blog_tags,
            articles_without_detail,
        };
        if !report.is_clean() {
            tracing::warn!(findings = report.finding_count(), "audit found schema invariant violations");
        }
        Ok(report)
    }

    fn audit_ids(&self, sql: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SchemaOptions;
    use crate::{ArticleType, NewArticle, NewBlog, NewCategory, NewTag, NewUser};

    #[test]
    fn test_clean_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alice = store
            .create_user(&NewUser::new("alice", "h", "Alice", "alice@example.com", "a.png"))
            .unwrap();
        let blog = store
            .create_blog(&NewBlog::new(alice.nid, "Alice", "alice", "default"))
            .unwrap();
        store
            .publish_article(&NewArticle::new(blog.nid, "Hi", "S", ArticleType::Python), "Body", &[])
            .unwrap();

        let report = store.audit().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.finding_count(), 0);
    }

    #[test]
    fn test_reports_findings() {
        let store = SqliteStore::open_in_memory_with(SchemaOptions {
            forbid_self_follow: false,
            ..Default::default()
        })
        .unwrap();
        let alice = store
            .create_user(&NewUser::new("alice", "h", "Alice", "alice@example.com", "a.png"))
            .unwrap();
        let bob = store
            .create_user(&NewUser::new("bob", "h", "Bob", "bob@example.com", "b.png"))
            .unwrap();
        store.follow(alice.nid, alice.nid).unwrap();
        store.follow(alice.nid, bob.nid).unwrap();

        let alice_blog = store
            .create_blog(&NewBlog::new(alice.nid, "Alice", "alice", "default"))
            .unwrap();
        let bob_blog = store
            .create_blog(&NewBlog::new(bob.nid, "Bob", "bob", "default"))
            .unwrap();
        let bob_category = store.create_category(&NewCategory::new(bob_blog.nid, "misc")).unwrap();
        let bob_tag = store.create_tag(&NewTag::new(bob_blog.nid, "misc")).unwrap();
        let article = store
            .create_article(&NewArticle::new(alice_blog.nid, "Hi", "S", ArticleType::Linux))
            .unwrap();

        // Written behind the store's back, as another application might
        store
            .conn
            .execute(
                "UPDATE articles SET category_id = ?1 WHERE nid = ?2",
                [bob_category.nid, article.nid],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO article_tags (article_id, tag_id) VALUES (?1, ?2)",
                [article.nid, bob_tag.nid],
            )
            .unwrap();

        let report = store.audit().unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.self_follows.len(), 1);
        assert_eq!(report.self_follows[0].user_id, alice.nid);
        assert_eq!(report.cross_blog_categories, vec![article.nid]);
        assert_eq!(report.cross_blog_tags, vec![(article.nid, bob_tag.nid)]);
        assert_eq!(report.articles_without_detail, vec![article.nid]);
        assert_eq!(report.finding_count(), 4);
    }
}
