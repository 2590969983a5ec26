//! Transaction operations
//!
//! Every query is scoped by the owning user id; a transaction belonging to
//! another user is indistinguishable from one that does not exist.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TxKind, UpdateTransaction};

pub(crate) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(3)?;
    let date: String = row.get(6)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        kind: kind.parse::<TxKind>().unwrap_or(TxKind::Expense),
        category: row.get(4)?,
        description: row.get(5)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const TX_COLUMNS: &str = "id, user_id, amount, kind, category, description, date, created_at";

impl Database {
    /// Insert a transaction for a user
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        if tx.amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Amount must be positive, got {}",
                tx.amount
            )));
        }
        if tx.category.trim().is_empty() {
            return Err(Error::InvalidData("Category is required".to_string()));
        }

        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, amount, kind, category, description, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.amount,
                tx.kind.as_str(),
                tx.category,
                tx.description,
                tx.date.to_string(),
            ],
        )?;

        self.get_transaction(user_id, conn.last_insert_rowid())
    }

    /// Fetch a single transaction, owner-scoped
    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Transaction> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "SELECT {} FROM transactions WHERE id = ? AND user_id = ?",
                TX_COLUMNS
            ),
            params![id, user_id],
            row_to_transaction,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    /// List a user's transactions, newest created first
    pub fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            TX_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Update fields of a transaction, owner-scoped
    ///
    /// Absent fields are left unchanged; the owner can never be changed.
    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        update: &UpdateTransaction,
    ) -> Result<Transaction> {
        if let Some(amount) = update.amount {
            if amount <= 0.0 {
                return Err(Error::InvalidData(format!(
                    "Amount must be positive, got {}",
                    amount
                )));
            }
        }

        // Fetch first so a missing row is a NotFound, not a silent no-op
        let existing = self.get_transaction(user_id, id)?;

        let amount = update.amount.unwrap_or(existing.amount);
        let kind = update.kind.unwrap_or(existing.kind);
        let category = update.category.clone().unwrap_or(existing.category);
        let description = update
            .description
            .clone()
            .or(existing.description);
        let date = update.date.unwrap_or(existing.date);

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE transactions
            SET amount = ?, kind = ?, category = ?, description = ?, date = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                amount,
                kind.as_str(),
                category,
                description,
                date.to_string(),
                id,
                user_id,
            ],
        )?;

        self.get_transaction(user_id, id)
    }

    /// Delete a transaction, owner-scoped
    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let affected = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if affected == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Count all transactions (for `tally status`)
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }
}
