//! Users and the fans relationship between them

use crate::fields::{self, AVATAR_MAX, NICKNAME_MAX, PASSWORD_MAX, USERNAME_MAX};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub nid: i64,
    pub username: String,
    /// Password hash as produced by the authentication layer
    #[serde(skip_serializing, default)]
    pub password: String,
    pub nickname: String,
    pub email: String,
    /// Storage path of the avatar image
    pub avatar: String,
    /// Set once at creation
    pub create_time: DateTime<Utc>,
}

/// Insert payload for a user. `create_time` is stamped by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub avatar: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            nickname: nickname.into(),
            email: email.into(),
            avatar: avatar.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        validate_nickname(&self.nickname)?;
        fields::validate_email(&self.email)?;
        validate_avatar(&self.avatar)
    }
}

/// Partial update of a user; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if let Some(nickname) = &self.nickname {
            validate_nickname(nickname)?;
        }
        if let Some(email) = &self.email {
            fields::validate_email(email)?;
        }
        if let Some(avatar) = &self.avatar {
            validate_avatar(avatar)?;
        }
        Ok(())
    }

    /// Apply the update to an in-memory copy of the user
    pub(crate) fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(nickname) = self.nickname {
            user.nickname = nickname;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    fields::required("user", "username", username, USERNAME_MAX)
}

fn validate_password(password: &str) -> Result<()> {
    fields::required("user", "password", password, PASSWORD_MAX)
}

fn validate_nickname(nickname: &str) -> Result<()> {
    fields::required("user", "nickname", nickname, NICKNAME_MAX)
}

fn validate_avatar(avatar: &str) -> Result<()> {
    fields::required("user", "avatar", avatar, AVATAR_MAX)
}

/// `follower_id` follows `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFans {
    pub id: i64,
    /// The followed user
    pub user_id: i64,
    /// The fan
    pub follower_id: i64,
}

impl UserFans {
    pub fn is_self_follow(&self) -> bool {
        self.user_id == self.follower_id
    }
}
