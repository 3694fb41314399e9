//! Field limits and validation shared by entities and DDL
//!
//! Lengths count characters, matching SQLite's `length()` on TEXT.

use crate::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MAX: usize = 64;
pub const NICKNAME_MAX: usize = 32;
pub const EMAIL_MAX: usize = 254;
pub const AVATAR_MAX: usize = 100;

pub const BLOG_TITLE_MAX: usize = 64;
pub const SITE_MAX: usize = 32;
pub const THEME_MAX: usize = 32;

pub const CATEGORY_TITLE_MAX: usize = 32;
pub const TAG_TITLE_MAX: usize = 32;

pub const ARTICLE_TITLE_MAX: usize = 128;
pub const SUMMARY_MAX: usize = 255;

lazy_static! {
    static ref EMAIL_RE: Regex = {
        let pattern = r"(?i)\A[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\z";
        Regex::new(pattern).expect("email pattern is valid")
    };
    static ref SITE_RE: Regex = Regex::new(r"\A[A-Za-z0-9_-]+\z").expect("site pattern is valid");
}

/// Check a required text field: non-empty and at most `max` characters
pub fn required(entity: &'static str, field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MissingField { entity, field });
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(Error::FieldTooLong {
            entity,
            field,
            max,
            actual,
        });
    }
    Ok(())
}

/// Check a required text field with no length limit
pub fn present(entity: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::MissingField { entity, field })
    } else {
        Ok(())
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    required("user", "email", email, EMAIL_MAX)?;
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(Error::InvalidEmail(email.to_string()))
    }
}

/// A site slug is used in URLs, so only ASCII letters, digits, `-` and `_`
pub fn validate_site(site: &str) -> Result<()> {
    required("blog", "site", site, SITE_MAX)?;
    if SITE_RE.is_match(site) {
        Ok(())
    } else {
        Err(Error::InvalidSite(site.to_string()))
    }
}
