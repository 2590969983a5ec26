//! Chat message log, append-only

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{ChatMessage, ChatRole};

impl Database {
    /// Append one chat turn
    pub fn append_chat_message(
        &self,
        user_id: i64,
        session_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO chat_messages (user_id, session_id, role, content) VALUES (?, ?, ?, ?)",
            params![user_id, session_id, role.as_str(), content],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List a user's chat history, oldest first, capped at `limit`
    pub fn list_chat_messages(&self, user_id: i64, limit: i64) -> Result<Vec<ChatMessage>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, session_id, role, content, created_at
            FROM chat_messages
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, limit], |row| {
            let role: String = row.get(3)?;
            Ok(ChatMessage {
                id: row.get(0)?,
                user_id: row.get(1)?,
                session_id: row.get(2)?,
                role: role.parse::<ChatRole>().unwrap_or(ChatRole::User),
                content: row.get(4)?,
                created_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Count all chat messages (for `tally status`)
    pub fn count_chat_messages(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))?)
    }
}
