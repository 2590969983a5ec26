//! Dashboard aggregation queries
//!
//! All aggregation happens in SQL; the snapshot assembly on top is a few
//! lines of shaping in [`Database::compute_snapshot`].

use chrono::{Datelike, NaiveDate};
use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::{
    CategorySpending, MonthComparison, StatsSnapshot, TrendPoint, Transaction,
};

/// First and last day of the month containing `date` (inclusive bounds)
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap();
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
    };
    (first, next_month.pred_opt().unwrap())
}

/// First and last day of the month before the one containing `date`
pub fn prev_month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (first, _) = month_bounds(date);
    let last_of_prev = first.pred_opt().unwrap();
    month_bounds(last_of_prev)
}

impl Database {
    /// Income and expense totals within an inclusive date window
    pub fn month_totals(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(f64, f64)> {
        let conn = self.conn()?;

        let (income, expense): (f64, f64) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE user_id = ? AND date BETWEEN ? AND ?
            "#,
            params![user_id, from.to_string(), to.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok((income, expense))
    }

    /// Expense total within an inclusive date window
    pub fn expense_total(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        let conn = self.conn()?;

        Ok(conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND kind = 'expense' AND date BETWEEN ? AND ?
            "#,
            params![user_id, from.to_string(), to.to_string()],
            |row| row.get(0),
        )?)
    }

    /// Expense totals per category across the full history, largest first
    pub fn category_breakdown(&self, user_id: i64) -> Result<Vec<CategorySpending>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT category, SUM(amount) AS total
            FROM transactions
            WHERE user_id = ? AND kind = 'expense'
            GROUP BY category
            ORDER BY total DESC, category
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(CategorySpending {
                name: row.get(0)?,
                value: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Expense totals per calendar month, chronological ascending
    ///
    /// Months that saw only income still appear with a zero expense total, so
    /// the trend line has no gaps while the account is active.
    pub fn monthly_trend(&self, user_id: i64) -> Result<Vec<TrendPoint>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                CAST(strftime('%Y', date) AS INTEGER) AS year,
                CAST(strftime('%m', date) AS INTEGER) AS month,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE user_id = ?
            GROUP BY year, month
            ORDER BY year, month
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let year: i64 = row.get(0)?;
            let month: i64 = row.get(1)?;
            Ok(TrendPoint {
                name: format!("{}/{}", month, year),
                expense: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Expense totals per day across the full history, for anomaly detection
    ///
    /// Days that saw only income appear with a zero total; the detector's
    /// average is over days with any activity, not just spending days.
    pub fn daily_expense_totals(&self, user_id: i64) -> Result<Vec<(String, f64)>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT date, COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE user_id = ?
            GROUP BY date
            ORDER BY date
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The most recently created transactions, for the dashboard
    pub fn recent_transactions(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, amount, kind, category, description, date, created_at
            FROM transactions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, limit], super::transactions::row_to_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Compute the full stats snapshot for a user as of `today`
    ///
    /// Pure read; safe to call concurrently and repeatedly. A user with no
    /// transactions yields all-zero aggregates and empty collections.
    pub fn compute_snapshot(&self, user_id: i64, today: NaiveDate) -> Result<StatsSnapshot> {
        let (first, last) = month_bounds(today);
        let (prev_first, prev_last) = prev_month_bounds(today);

        let (income, expense) = self.month_totals(user_id, first, last)?;
        let savings = income - expense;

        let category_breakdown = self.category_breakdown(user_id)?;
        let monthly_trend = self.monthly_trend(user_id)?;
        let recent = self.recent_transactions(user_id, 3)?;

        let this_month = self.expense_total(user_id, first, last)?;
        let last_month = self.expense_total(user_id, prev_first, prev_last)?;
        let percent_change = if last_month > 0.0 {
            Some((this_month - last_month) / last_month * 100.0)
        } else {
            None
        };

        Ok(StatsSnapshot {
            income,
            expense,
            savings,
            category_breakdown,
            monthly_trend,
            month_comparison: MonthComparison {
                this_month,
                last_month,
                difference: this_month - last_month,
                percent_change,
            },
            recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2025, 11, 15).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
    }

    #[test]
    fn test_month_bounds_december() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_prev_month_bounds_january() {
        let (first, last) = prev_month_bounds(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_leap_february() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
