//! User and fan operations

use super::sqlite::{write_error, SqliteStore};
use crate::user::{NewUser, User, UserFans, UserUpdate};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

const USER_COLUMNS: &str = "u.nid, u.username, u.password, u.nickname, u.email, u.avatar, u.create_time";

impl SqliteStore {
    // ========== User Operations ==========

    /// Insert a user, stamping `create_time`
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        user.validate()?;
        self.conn
            .execute(
                r#"
                INSERT INTO users (username, password, nickname, email, avatar, create_time)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    user.username,
                    user.password,
                    user.nickname,
                    user.email,
                    user.avatar,
                    Utc::now(),
                ],
            )
            .map_err(write_error("user"))?;

        let nid = self.conn.last_insert_rowid();
        tracing::debug!(nid, username = %user.username, "created user");
        self.require_user(nid)
    }

    /// Get a user by primary key
    pub fn get_user(&self, nid: i64) -> Result<Option<User>> {
        self.query_user("u.nid = ?1", rusqlite::params![nid])
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user("u.username = ?1", rusqlite::params![username])
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_user("u.email = ?1", rusqlite::params![email])
    }

    fn query_user(&self, predicate: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE {}", USER_COLUMNS, predicate),
                params,
                |row| self.row_to_user(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub(crate) fn require_user(&self, nid: i64) -> Result<User> {
        self.get_user(nid)?.ok_or_else(|| Error::not_found("user", nid))
    }

    /// Apply a partial update. `create_time` is never written.
    pub fn update_user(&self, nid: i64, update: UserUpdate) -> Result<User> {
        update.validate()?;
        let mut user = self.require_user(nid)?;
        update.apply_to(&mut user);

        self.conn
            .execute(
                r#"
                UPDATE users
                SET username = ?1, password = ?2, nickname = ?3, email = ?4, avatar = ?5
                WHERE nid = ?6
                "#,
                params![
                    user.username,
                    user.password,
                    user.nickname,
                    user.email,
                    user.avatar,
                    nid,
                ],
            )
            .map_err(write_error("user"))?;

        tracing::debug!(nid, "updated user");
        Ok(user)
    }

    /// Delete a user; owned rows follow the configured delete policy
    pub fn delete_user(&self, nid: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE nid = ?1", [nid])
            .map_err(write_error("user"))?;
        if deleted == 0 {
            return Err(Error::not_found("user", nid));
        }
        tracing::debug!(nid, "deleted user");
        Ok(())
    }

    /// Count all users
    pub fn count_users(&self) -> Result<usize> {
        self.count("users")
    }

    /// Helper to convert a row to a User
    fn row_to_user(&self, row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            nid: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            nickname: row.get(3)?,
            email: row.get(4)?,
            avatar: row.get(5)?,
            create_time: row.get(6)?,
        })
    }

    // ========== Fan Operations ==========

    /// Record that `follower_id` follows `user_id`
    pub fn follow(&self, user_id: i64, follower_id: i64) -> Result<UserFans> {
        if self.options.forbid_self_follow && user_id == follower_id {
            return Err(Error::SelfFollow(user_id));
        }

        self.conn
            .execute(
                "INSERT INTO user_fans (user_id, follower_id) VALUES (?1, ?2)",
                params![user_id, follower_id],
            )
            .map_err(write_error("user_fans"))?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(user_id, follower_id, "follow");
        Ok(UserFans {
            id,
            user_id,
            follower_id,
        })
    }

    /// Remove a follow; returns whether one existed
    pub fn unfollow(&self, user_id: i64, follower_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM user_fans WHERE user_id = ?1 AND follower_id = ?2",
            params![user_id, follower_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn is_following(&self, user_id: i64, follower_id: i64) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM user_fans WHERE user_id = ?1 AND follower_id = ?2)",
            params![user_id, follower_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Users following `user_id`, in follow order
    pub fn fans_of(&self, user_id: i64) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users u JOIN user_fans f ON f.follower_id = u.nid WHERE f.user_id = ?1 ORDER BY f.id",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([user_id], |row| self.row_to_user(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Users that `follower_id` follows, in follow order
    pub fn following(&self, follower_id: i64) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users u JOIN user_fans f ON f.user_id = u.nid WHERE f.follower_id = ?1 ORDER BY f.id",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([follower_id], |row| self.row_to_user(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn fan_count(&self, user_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_fans WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
