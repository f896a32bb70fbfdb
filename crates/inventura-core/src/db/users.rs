//! Account and session rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{from_micros, to_micros};
use crate::model::{Role, User};

/// A user row including credential material. Never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub user: User,
    pub password_salt: String,
    pub password_hash: String,
}

/// A live bearer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    "user_id, username, email, role, created_at_us, last_login_us, password_salt, password_hash";

pub fn insert_user(conn: &Connection, stored: &StoredUser) -> Result<()> {
    let user = &stored.user;
    conn.execute(
        "INSERT INTO users (user_id, username, email, password_salt, password_hash,
            role, created_at_us, last_login_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.username,
            user.email,
            stored.password_salt,
            stored.password_hash,
            user.role.as_str(),
            to_micros(user.created_at),
            user.last_login.map(to_micros)
        ],
    )
    .with_context(|| format!("insert user '{}'", user.username))?;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<StoredUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    conn.query_row(&sql, params![user_id], row_to_stored_user)
        .optional()
        .with_context(|| format!("get_user '{user_id}'"))
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<StoredUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    conn.query_row(&sql, params![email], row_to_stored_user)
        .optional()
        .context("find user by email")
}

pub fn username_taken(conn: &Connection, username: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        params![username],
        |row| row.get(0),
    )
    .context("check username uniqueness")
}

pub fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        params![email],
        |row| row.get(0),
    )
    .context("check email uniqueness")
}

pub fn touch_last_login(conn: &Connection, user_id: &str, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login_us = ?2 WHERE user_id = ?1",
        params![user_id, to_micros(at)],
    )
    .with_context(|| format!("update last_login for '{user_id}'"))?;
    Ok(())
}

pub fn delete_user(conn: &Connection, user_id: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM users WHERE user_id = ?1", params![user_id])
        .with_context(|| format!("delete user '{user_id}'"))?;
    Ok(removed > 0)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at_us, expires_at_us)
         VALUES (?1, ?2, ?3, ?4)",
        params![token_hash, user_id, to_micros(created_at), to_micros(expires_at)],
    )
    .context("insert session")?;
    Ok(())
}

pub fn get_session(conn: &Connection, token_hash: &str) -> Result<Option<StoredSession>> {
    conn.query_row(
        "SELECT user_id, created_at_us, expires_at_us FROM sessions WHERE token_hash = ?1",
        params![token_hash],
        |row| {
            Ok(StoredSession {
                user_id: row.get(0)?,
                created_at: from_micros(1, row.get(1)?)?,
                expires_at: from_micros(2, row.get(2)?)?,
            })
        },
    )
    .optional()
    .context("get session")
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])
        .context("delete session")?;
    Ok(removed > 0)
}

/// Drop sessions that expired before `now`. Returns how many were removed.
pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at_us <= ?1",
        params![to_micros(now)],
    )
    .context("purge expired sessions")
}

fn row_to_stored_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredUser> {
    let role: String = row.get(3)?;
    let last_login: Option<i64> = row.get(5)?;
    Ok(StoredUser {
        user: User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            role: Role::from_db(&role),
            created_at: from_micros(4, row.get(4)?)?,
            last_login: last_login.map(|us| from_micros(5, us)).transpose()?,
        },
        password_salt: row.get(6)?,
        password_hash: row.get(7)?,
    })
}
