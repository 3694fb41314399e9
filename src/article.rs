//! Articles, their bodies, and the article/tag association

use crate::fields::{self, ARTICLE_TITLE_MAX, SUMMARY_MAX};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Fixed set of article types. Stored as the integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleType {
    Python,
    Linux,
    MySQL,
    GOLang,
}

impl ArticleType {
    /// Persisted integer id
    pub fn id(&self) -> i64 {
        match self {
            ArticleType::Python => 1,
            ArticleType::Linux => 2,
            ArticleType::MySQL => 3,
            ArticleType::GOLang => 4,
        }
    }

    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Python => "Python",
            ArticleType::Linux => "Linux",
            ArticleType::MySQL => "MySQL",
            ArticleType::GOLang => "GOLang",
        }
    }

    pub fn all() -> &'static [ArticleType] {
        &[
            ArticleType::Python,
            ArticleType::Linux,
            ArticleType::MySQL,
            ArticleType::GOLang,
        ]
    }
}

impl TryFrom<i64> for ArticleType {
    type Error = Error;

    fn try_from(id: i64) -> Result<Self> {
        ArticleType::all()
            .iter()
            .copied()
            .find(|t| t.id() == id)
            .ok_or_else(|| Error::UnknownArticleType(id.to_string()))
    }
}

impl FromStr for ArticleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(ArticleType::Python),
            "linux" => Ok(ArticleType::Linux),
            "mysql" => Ok(ArticleType::MySQL),
            "golang" | "go" => Ok(ArticleType::GOLang),
            _ => Err(Error::UnknownArticleType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ArticleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for ArticleType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.id()))
    }
}

impl FromSql for ArticleType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let id = value.as_i64()?;
        ArticleType::try_from(id).map_err(|_| FromSqlError::OutOfRange(id))
    }
}

/// Interaction counters kept on the article row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleCounter {
    Read,
    Comment,
    Up,
    Down,
}

impl ArticleCounter {
    pub fn column(&self) -> &'static str {
        match self {
            ArticleCounter::Read => "read_count",
            ArticleCounter::Comment => "comment_count",
            ArticleCounter::Up => "up_count",
            ArticleCounter::Down => "down_count",
        }
    }
}

/// Article metadata. The body lives in [`ArticleDetail`] so list queries stay small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub nid: i64,
    pub title: String,
    pub summary: String,
    pub read_count: i64,
    pub comment_count: i64,
    pub up_count: i64,
    pub down_count: i64,
    pub create_time: DateTime<Utc>,
    pub blog_id: i64,
    pub category_id: Option<i64>,
    pub article_type: ArticleType,
}

impl Article {
    pub fn counter(&self, counter: ArticleCounter) -> i64 {
        match counter {
            ArticleCounter::Read => self.read_count,
            ArticleCounter::Comment => self.comment_count,
            ArticleCounter::Up => self.up_count,
            ArticleCounter::Down => self.down_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub blog_id: i64,
    pub category_id: Option<i64>,
    pub article_type: ArticleType,
}

impl NewArticle {
    pub fn new(
        blog_id: i64,
        title: impl Into<String>,
        summary: impl Into<String>,
        article_type: ArticleType,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            blog_id,
            category_id: None,
            article_type,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_summary(&self.summary)
    }
}

/// Partial update of an article.
///
/// `category_id: Some(None)` clears the category. Counters and
/// `create_time` cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Absent leaves the category, `null` clears it
    #[serde(default, deserialize_with = "present_or_null")]
    pub category_id: Option<Option<i64>>,
    pub article_type: Option<ArticleType>,
}

/// Deserialize a field that is present (possibly `null`) into `Some`
fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ArticleUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(summary) = &self.summary {
            validate_summary(summary)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(summary) = self.summary {
            article.summary = summary;
        }
        if let Some(category_id) = self.category_id {
            article.category_id = category_id;
        }
        if let Some(article_type) = self.article_type {
            article.article_type = article_type;
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    fields::required("article", "title", title, ARTICLE_TITLE_MAX)
}

fn validate_summary(summary: &str) -> Result<()> {
    fields::required("article", "summary", summary, SUMMARY_MAX)
}

/// Full text of an article, one row per article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub content: String,
    pub article_id: i64,
}

pub(crate) fn validate_content(content: &str) -> Result<()> {
    fields::present("article_detail", "content", content)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article2Tag {
    pub id: i64,
    pub article_id: i64,
    pub tag_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_type_ids() {
        assert_eq!(ArticleType::Python.id(), 1);
        assert_eq!(ArticleType::Linux.id(), 2);
        assert_eq!(ArticleType::MySQL.id(), 3);
        assert_eq!(ArticleType::GOLang.id(), 4);

        assert_eq!(ArticleType::try_from(3).unwrap(), ArticleType::MySQL);
        assert!(matches!(ArticleType::try_from(5), Err(Error::UnknownArticleType(_))));
        assert!(ArticleType::try_from(0).is_err());
    }

    #[test]
    fn test_article_type_parse() {
        assert_eq!("golang".parse::<ArticleType>().unwrap(), ArticleType::GOLang);
        assert_eq!("MySQL".parse::<ArticleType>().unwrap(), ArticleType::MySQL);
        assert!("rust".parse::<ArticleType>().is_err());
        assert_eq!(ArticleType::Linux.to_string(), "Linux");
    }

    #[test]
    fn test_article_update_clears_category() {
        let mut article = Article {
            nid: 1,
            title: "t".into(),
            summary: "s".into(),
            read_count: 4,
            comment_count: 0,
            up_count: 0,
            down_count: 0,
            create_time: Utc::now(),
            blog_id: 1,
            category_id: Some(2),
            article_type: ArticleType::Python,
        };
        ArticleUpdate {
            category_id: Some(None),
            ..Default::default()
        }
        .apply_to(&mut article);
        assert_eq!(article.category_id, None);
        assert_eq!(article.counter(ArticleCounter::Read), 4);
    }

    #[test]
    fn test_article_update_from_json() {
        let clear: ArticleUpdate = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(clear.category_id, Some(None));

        let set: ArticleUpdate = serde_json::from_str(r#"{"category_id": 3}"#).unwrap();
        assert_eq!(set.category_id, Some(Some(3)));

        let untouched: ArticleUpdate = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(untouched.category_id, None);
        assert_eq!(untouched.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_new_article_validate() {
        let ok = NewArticle::new(1, "Title", "Summary", ArticleType::Linux);
        assert!(ok.validate().is_ok());

        let long = NewArticle::new(1, "Title", "s".repeat(256), ArticleType::Linux);
        assert!(matches!(
            long.validate(),
            Err(Error::FieldTooLong { field: "summary", max: 255, .. })
        ));
    }
}
