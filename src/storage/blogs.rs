//! Blog, category and tag operations

use super::sqlite::{write_error, SqliteStore};
use crate::blog::{self, Blog, BlogUpdate, Category, NewBlog, NewCategory, NewTag, Tag};
use crate::{Error, Result};
use rusqlite::{params, OptionalExtension};

impl SqliteStore {
    // ========== Blog Operations ==========

    /// Create the blog of a user. A user owns at most one blog.
    pub fn create_blog(&self, blog: &NewBlog) -> Result<Blog> {
        blog.validate()?;
        self.conn
            .execute(
                "INSERT INTO blogs (title, site, theme, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![blog.title, blog.site, blog.theme, blog.user_id],
            )
            .map_err(write_error("blog"))?;

        let nid = self.conn.last_insert_rowid();
        tracing::debug!(nid, site = %blog.site, "created blog");
        Ok(Blog {
            nid,
            title: blog.title.clone(),
            site: blog.site.clone(),
            theme: blog.theme.clone(),
            user_id: blog.user_id,
        })
    }

    pub fn get_blog(&self, nid: i64) -> Result<Option<Blog>> {
        self.conn
            .query_row(
                "SELECT nid, title, site, theme, user_id FROM blogs WHERE nid = ?1",
                [nid],
                |row| self.row_to_blog(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Look a blog up by its site slug
    pub fn get_blog_by_site(&self, site: &str) -> Result<Option<Blog>> {
        self.conn
            .query_row(
                "SELECT nid, title, site, theme, user_id FROM blogs WHERE site = ?1",
                [site],
                |row| self.row_to_blog(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_blog_for_user(&self, user_id: i64) -> Result<Option<Blog>> {
        self.conn
            .query_row(
                "SELECT nid, title, site, theme, user_id FROM blogs WHERE user_id = ?1",
                [user_id],
                |row| self.row_to_blog(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn update_blog(&self, nid: i64, update: BlogUpdate) -> Result<Blog> {
        update.validate()?;
        let mut blog = self.get_blog(nid)?.ok_or_else(|| Error::not_found("blog", nid))?;
        update.apply_to(&mut blog);

        self.conn
            .execute(
                "UPDATE blogs SET title = ?1, site = ?2, theme = ?3 WHERE nid = ?4",
                params![blog.title, blog.site, blog.theme, nid],
            )
            .map_err(write_error("blog"))?;
        Ok(blog)
    }

    /// Delete a blog; categories, tags and articles follow the delete policy
    pub fn delete_blog(&self, nid: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM blogs WHERE nid = ?1", [nid])
            .map_err(write_error("blog"))?;
        if deleted == 0 {
            return Err(Error::not_found("blog", nid));
        }
        tracing::debug!(nid, "deleted blog");
        Ok(())
    }

    fn row_to_blog(&self, row: &rusqlite::Row) -> rusqlite::Result<Blog> {
        Ok(Blog {
            nid: row.get(0)?,
            title: row.get(1)?,
            site: row.get(2)?,
            theme: row.get(3)?,
            user_id: row.get(4)?,
        })
    }

    // ========== Category Operations ==========

    pub fn create_category(&self, category: &NewCategory) -> Result<Category> {
        category.validate()?;
        self.conn
            .execute(
                "INSERT INTO categories (title, blog_id) VALUES (?1, ?2)",
                params![category.title, category.blog_id],
            )
            .map_err(write_error("category"))?;
        Ok(Category {
            nid: self.conn.last_insert_rowid(),
            title: category.title.clone(),
            blog_id: category.blog_id,
        })
    }

    pub fn get_category(&self, nid: i64) -> Result<Option<Category>> {
        self.conn
            .query_row(
                "SELECT nid, title, blog_id FROM categories WHERE nid = ?1",
                [nid],
                |row| {
                    Ok(Category {
                        nid: row.get(0)?,
                        title: row.get(1)?,
                        blog_id: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Categories of a blog, in creation order
    pub fn categories_of(&self, blog_id: i64) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nid, title, blog_id FROM categories WHERE blog_id = ?1 ORDER BY nid")?;
        let categories = stmt
            .query_map([blog_id], |row| {
                Ok(Category {
                    nid: row.get(0)?,
                    title: row.get(1)?,
                    blog_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn rename_category(&self, nid: i64, title: &str) -> Result<Category> {
        blog::validate_category_title(title)?;
        let updated = self
            .conn
            .execute("UPDATE categories SET title = ?1 WHERE nid = ?2", params![title, nid])
            .map_err(write_error("category"))?;
        if updated == 0 {
            return Err(Error::not_found("category", nid));
        }
        self.get_category(nid)?.ok_or_else(|| Error::not_found("category", nid))
    }

    /// Delete a category; its articles follow the category delete policy
    pub fn delete_category(&self, nid: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM categories WHERE nid = ?1", [nid])
            .map_err(write_error("category"))?;
        if deleted == 0 {
            return Err(Error::not_found("category", nid));
        }
        Ok(())
    }

    // ========== Tag Operations ==========

    pub fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        tag.validate()?;
        self.conn
            .execute(
                "INSERT INTO tags (title, blog_id) VALUES (?1, ?2)",
                params![tag.title, tag.blog_id],
            )
            .map_err(write_error("tag"))?;
        Ok(Tag {
            nid: self.conn.last_insert_rowid(),
            title: tag.title.clone(),
            blog_id: tag.blog_id,
        })
    }

    pub fn get_tag(&self, nid: i64) -> Result<Option<Tag>> {
        self.conn
            .query_row(
                "SELECT nid, title, blog_id FROM tags WHERE nid = ?1",
                [nid],
                |row| self.row_to_tag(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Tags of a blog, in creation order
    pub fn tags_of(&self, blog_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nid, title, blog_id FROM tags WHERE blog_id = ?1 ORDER BY nid")?;
        let tags = stmt
            .query_map([blog_id], |row| self.row_to_tag(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn rename_tag(&self, nid: i64, title: &str) -> Result<Tag> {
        blog::validate_tag_title(title)?;
        let updated = self
            .conn
            .execute("UPDATE tags SET title = ?1 WHERE nid = ?2", params![title, nid])
            .map_err(write_error("tag"))?;
        if updated == 0 {
            return Err(Error::not_found("tag", nid));
        }
        self.get_tag(nid)?.ok_or_else(|| Error::not_found("tag", nid))
    }

    pub fn delete_tag(&self, nid: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM tags WHERE nid = ?1", [nid])
            .map_err(write_error("tag"))?;
        if deleted == 0 {
            return Err(Error::not_found("tag", nid));
        }
        Ok(())
    }

    pub(crate) fn row_to_tag(&self, row: &rusqlite::Row) -> rusqlite::Result<Tag> {
        Ok(Tag {
            nid: row.get(0)?,
            title: row.get(1)?,
            blog_id: row.get(2)?,
        })
    }
}
