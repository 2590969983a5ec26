//! AI response cache operations
//!
//! Entries are keyed by `{user_id}_{endpoint}_{stats_hash}` so a changed
//! fingerprint naturally misses and triggers regeneration. Expiry is checked
//! at read time; rows that outlive their TTL are invisible to `get` whether
//! or not the reaper has removed them yet.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

use super::{format_datetime, Database};
use crate::error::Result;
use crate::fingerprint::cache_key;
use crate::models::CacheEntry;

impl Database {
    /// Look up a live cached response. Returns None on miss or expiry.
    pub fn get_cached_response(
        &self,
        user_id: i64,
        endpoint: &str,
        stats_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let key = cache_key(user_id, endpoint, stats_hash);
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                "SELECT response FROM ai_cache WHERE cache_key = ? AND expires_at > ?",
                params![key, format_datetime(now)],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Upsert a response with the given TTL
    ///
    /// An existing row for the same key is overwritten whether it was live or
    /// stale; two concurrent writers race and the last one wins.
    pub fn save_cached_response(
        &self,
        user_id: i64,
        endpoint: &str,
        stats_hash: &str,
        response: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let key = cache_key(user_id, endpoint, stats_hash);
        let expires_at = format_datetime(now + ttl);
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO ai_cache (cache_key, user_id, endpoint, stats_hash, response, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                response = excluded.response,
                stats_hash = excluded.stats_hash,
                expires_at = excluded.expires_at,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, user_id, endpoint, stats_hash, response, expires_at],
        )?;

        Ok(())
    }

    /// Fetch a cache entry regardless of expiry (diagnostics and tests)
    pub fn get_cache_entry(
        &self,
        user_id: i64,
        endpoint: &str,
        stats_hash: &str,
    ) -> Result<Option<CacheEntry>> {
        let key = cache_key(user_id, endpoint, stats_hash);
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                r#"
                SELECT cache_key, user_id, endpoint, stats_hash, response,
                       expires_at, created_at, updated_at
                FROM ai_cache WHERE cache_key = ?
                "#,
                params![key],
                |row| {
                    Ok(CacheEntry {
                        cache_key: row.get(0)?,
                        user_id: row.get(1)?,
                        endpoint: row.get(2)?,
                        stats_hash: row.get(3)?,
                        response: row.get(4)?,
                        expires_at: super::parse_datetime(&row.get::<_, String>(5)?),
                        created_at: super::parse_datetime(&row.get::<_, String>(6)?),
                        updated_at: super::parse_datetime(&row.get::<_, String>(7)?),
                    })
                },
            )
            .optional()?)
    }

    /// Delete expired rows; returns how many were reclaimed
    ///
    /// Storage reclamation only - `get` already treats expired rows as absent.
    pub fn purge_expired_cache(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn()?;

        Ok(conn.execute(
            "DELETE FROM ai_cache WHERE expires_at <= ?",
            params![format_datetime(now)],
        )?)
    }

    /// Count all cache rows, live or stale (for `tally status`)
    pub fn count_cache_entries(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM ai_cache", [], |row| row.get(0))?)
    }
}
