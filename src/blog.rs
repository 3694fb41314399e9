//! Blogs and the categories and tags that live inside them

use crate::fields::{self, BLOG_TITLE_MAX, CATEGORY_TITLE_MAX, TAG_TITLE_MAX, THEME_MAX};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A user's blog. Each user owns at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub nid: i64,
    pub title: String,
    /// Unique slug used for routing
    pub site: String,
    pub theme: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlog {
    pub title: String,
    pub site: String,
    pub theme: String,
    pub user_id: i64,
}

impl NewBlog {
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        site: impl Into<String>,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            site: site.into(),
            theme: theme.into(),
            user_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        fields::validate_site(&self.site)?;
        validate_theme(&self.theme)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub site: Option<String>,
    pub theme: Option<String>,
}

impl BlogUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(site) = &self.site {
            fields::validate_site(site)?;
        }
        if let Some(theme) = &self.theme {
            validate_theme(theme)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, blog: &mut Blog) {
        if let Some(title) = self.title {
            blog.title = title;
        }
        if let Some(site) = self.site {
            blog.site = site;
        }
        if let Some(theme) = self.theme {
            blog.theme = theme;
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    fields::required("blog", "title", title, BLOG_TITLE_MAX)
}

fn validate_theme(theme: &str) -> Result<()> {
    fields::required("blog", "theme", theme, THEME_MAX)
}

/// Per-blog article category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub nid: i64,
    pub title: String,
    pub blog_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub title: String,
    pub blog_id: i64,
}

impl NewCategory {
    pub fn new(blog_id: i64, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blog_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_category_title(&self.title)
    }
}

pub(crate) fn validate_category_title(title: &str) -> Result<()> {
    fields::required("category", "title", title, CATEGORY_TITLE_MAX)
}

/// Per-blog tag, attached to articles through `Article2Tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub nid: i64,
    pub title: String,
    pub blog_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub title: String,
    pub blog_id: i64,
}

impl NewTag {
    pub fn new(blog_id: i64, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blog_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_tag_title(&self.title)
    }
}

pub(crate) fn validate_tag_title(title: &str) -> Result<()> {
    fields::required("tag", "title", title, TAG_TITLE_MAX)
}
