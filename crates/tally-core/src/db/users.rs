//! User account operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

impl Database {
    /// Create a user; fails with InvalidData if the email is taken
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Err(Error::InvalidData(format!(
                "User already exists: {}",
                email
            )));
        }

        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)",
            params![name, email, password_hash],
        )?;

        self.get_user(conn.last_insert_rowid())
    }

    /// Fetch a user by id
    pub fn get_user(&self, id: i64) -> Result<User> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
            params![id],
            row_to_user,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    /// Fetch a user by email (for login)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
                params![email],
                row_to_user,
            )
            .optional()?)
    }

    /// Count registered users
    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }
}
