//! Article, article body and article/tag operations

use super::sqlite::{write_error, SqliteStore};
use crate::article::{self, Article, Article2Tag, ArticleCounter, ArticleDetail, ArticleUpdate, NewArticle};
use crate::blog::Tag;
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

const ARTICLE_COLUMNS: &str = "a.nid, a.title, a.summary, a.read_count, a.comment_count, a.up_count, a.down_count, a.create_time, a.blog_id, a.category_id, a.article_type";

impl SqliteStore {
    // ========== Article Operations ==========

    /// Insert an article with zeroed counters, stamping `create_time`
    pub fn create_article(&self, article: &NewArticle) -> Result<Article> {
        article.validate()?;
        if let Some(category_id) = article.category_id {
            self.check_category_blog(category_id, article.blog_id)?;
        }

        self.conn
            .execute(
                r#"
                INSERT INTO articles (title, summary, create_time, blog_id, category_id, article_type)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    article.title,
                    article.summary,
                    Utc::now(),
                    article.blog_id,
                    article.category_id,
                    article.article_type,
                ],
            )
            .map_err(write_error("article"))?;

        let nid = self.conn.last_insert_rowid();
        tracing::debug!(nid, blog_id = article.blog_id, "created article");
        self.require_article(nid)
    }

    /// Create an article together with its body and tags, all or nothing
    pub fn publish_article(
        &self,
        article: &NewArticle,
        content: &str,
        tag_ids: &[i64],
    ) -> Result<(Article, ArticleDetail)> {
        article::validate_content(content)?;
        self.transaction(|store| {
            let created = store.create_article(article)?;
            let detail = store.create_article_detail(created.nid, content)?;
            for tag_id in tag_ids {
                store.tag_article(created.nid, *tag_id)?;
            }
            Ok((created, detail))
        })
    }

    pub fn get_article(&self, nid: i64) -> Result<Option<Article>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM articles a WHERE a.nid = ?1", ARTICLE_COLUMNS),
                [nid],
                |row| self.row_to_article(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub(crate) fn require_article(&self, nid: i64) -> Result<Article> {
        self.get_article(nid)?.ok_or_else(|| Error::not_found("article", nid))
    }

    /// Articles of a blog, newest first. Bodies are not loaded.
    pub fn articles_of(&self, blog_id: i64) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {} FROM articles a WHERE a.blog_id = ?1 ORDER BY a.nid DESC",
                ARTICLE_COLUMNS
            ),
            blog_id,
        )
    }

    pub fn articles_in_category(&self, category_id: i64) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {} FROM articles a WHERE a.category_id = ?1 ORDER BY a.nid DESC",
                ARTICLE_COLUMNS
            ),
            category_id,
        )
    }

    fn query_articles(&self, sql: &str, key: i64) -> Result<Vec<Article>> {
        let mut stmt = self.conn.prepare(sql)?;
        let articles = stmt
            .query_map([key], |row| self.row_to_article(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(articles)
    }

    /// Update title, summary, category or type. Counters and
    /// `create_time` are left alone.
    pub fn update_article(&self, nid: i64, update: ArticleUpdate) -> Result<Article> {
        update.validate()?;
        let mut article = self.require_article(nid)?;
        update.apply_to(&mut article);
        if let Some(category_id) = article.category_id {
            self.check_category_blog(category_id, article.blog_id)?;
        }

        self.conn
            .execute(
                r#"
                UPDATE articles
                SET title = ?1, summary = ?2, category_id = ?3, article_type = ?4
                WHERE nid = ?5
                "#,
                params![
                    article.title,
                    article.summary,
                    article.category_id,
                    article.article_type,
                    nid,
                ],
            )
            .map_err(write_error("article"))?;
        Ok(article)
    }

    pub fn delete_article(&self, nid: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM articles WHERE nid = ?1", [nid])
            .map_err(write_error("article"))?;
        if deleted == 0 {
            return Err(Error::not_found("article", nid));
        }
        tracing::debug!(nid, "deleted article");
        Ok(())
    }

    /// Add one to a counter, returning the new value
    pub fn increment_counter(&self, nid: i64, counter: ArticleCounter) -> Result<i64> {
        self.adjust_counter(nid, counter, 1)
    }

    /// Add `delta` to a counter in a single statement, never going below zero.
    ///
    /// A delta that would push the counter past `i64::MAX` writes nothing and
    /// fails with [`Error::CounterOverflow`].
    pub fn adjust_counter(&self, nid: i64, counter: ArticleCounter, delta: i64) -> Result<i64> {
        let column = counter.column();
        let value: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    r#"
                    UPDATE articles SET {column} = MAX(0, {column} + ?1)
                    WHERE nid = ?2 AND (?1 <= 0 OR {column} <= 9223372036854775807 - ?1)
                    RETURNING {column}
                    "#
                ),
                params![delta, nid],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(value) => Ok(value),
            None if self.get_article(nid)?.is_some() => Err(Error::CounterOverflow {
                article: nid,
                counter: column,
            }),
            None => Err(Error::not_found("article", nid)),
        }
    }

    /// The category must exist and belong to `blog_id`
    fn check_category_blog(&self, category_id: i64, blog_id: i64) -> Result<()> {
        let category = self
            .get_category(category_id)?
            .ok_or(Error::ForeignKey("article"))?;
        if category.blog_id != blog_id {
            return Err(Error::CrossBlog {
                entity: "category",
                id: category_id,
                expected: blog_id,
                found: category.blog_id,
            });
        }
        Ok(())
    }

    /// Helper to convert a row to an Article
    fn row_to_article(&self, row: &rusqlite::Row) -> rusqlite::Result<Article> {
        Ok(Article {
            nid: row.get(0)?,
            title: row.get(1)?,
            summary: row.get(2)?,
            read_count: row.get(3)?,
            comment_count: row.get(4)?,
            up_count: row.get(5)?,
            down_count: row.get(6)?,
            create_time: row.get(7)?,
            blog_id: row.get(8)?,
            category_id: row.get(9)?,
            article_type: row.get(10)?,
        })
    }

    // ========== Article Detail Operations ==========

    /// Insert the body of an article; an article has at most one
    pub fn create_article_detail(&self, article_id: i64, content: &str) -> Result<ArticleDetail> {
        article::validate_content(content)?;
        self.conn
            .execute(
                "INSERT INTO article_details (content, article_id) VALUES (?1, ?2)",
                params![content, article_id],
            )
            .map_err(write_error("article_detail"))?;
        Ok(ArticleDetail {
            id: self.conn.last_insert_rowid(),
            content: content.to_string(),
            article_id,
        })
    }

    /// Create or replace the body of an article
    pub fn set_article_content(&self, article_id: i64, content: &str) -> Result<ArticleDetail> {
        article::validate_content(content)?;
        let id: i64 = self
            .conn
            .query_row(
                r#"
                INSERT INTO article_details (content, article_id) VALUES (?1, ?2)
                ON CONFLICT(article_id) DO UPDATE SET content = excluded.content
                RETURNING id
                "#,
                params![content, article_id],
                |row| row.get(0),
            )
            .map_err(write_error("article_detail"))?;
        Ok(ArticleDetail {
            id,
            content: content.to_string(),
            article_id,
        })
    }

    pub fn get_article_detail(&self, article_id: i64) -> Result<Option<ArticleDetail>> {
        self.conn
            .query_row(
                "SELECT id, content, article_id FROM article_details WHERE article_id = ?1",
                [article_id],
                |row| {
                    Ok(ArticleDetail {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        article_id: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Article Tag Operations ==========

    /// Attach a tag of the same blog to an article
    pub fn tag_article(&self, article_id: i64, tag_id: i64) -> Result<Article2Tag> {
        let article = self.get_article(article_id)?.ok_or(Error::ForeignKey("article_tag"))?;
        let tag = self.get_tag(tag_id)?.ok_or(Error::ForeignKey("article_tag"))?;
        if tag.blog_id != article.blog_id {
            return Err(Error::CrossBlog {
                entity: "tag",
                id: tag_id,
                expected: article.blog_id,
                found: tag.blog_id,
            });
        }

        self.conn
            .execute(
                "INSERT INTO article_tags (article_id, tag_id) VALUES (?1, ?2)",
                params![article_id, tag_id],
            )
            .map_err(write_error("article_tag"))?;
        Ok(Article2Tag {
            id: self.conn.last_insert_rowid(),
            article_id,
            tag_id,
        })
    }

    /// Detach a tag; returns whether the link existed
    pub fn untag_article(&self, article_id: i64, tag_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM article_tags WHERE article_id = ?1 AND tag_id = ?2",
            params![article_id, tag_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn tags_for_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.nid, t.title, t.blog_id FROM tags t JOIN article_tags l ON l.tag_id = t.nid WHERE l.article_id = ?1 ORDER BY l.id",
        )?;
        let tags = stmt
            .query_map([article_id], |row| self.row_to_tag(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn articles_for_tag(&self, tag_id: i64) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {} FROM articles a JOIN article_tags l ON l.article_id = a.nid WHERE l.tag_id = ?1 ORDER BY a.nid DESC",
                ARTICLE_COLUMNS
            ),
            tag_id,
        )
    }
}
