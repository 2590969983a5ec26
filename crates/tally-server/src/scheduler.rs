//! Background cache reaper
//!
//! Expired AI cache entries are already invisible to reads; this task only
//! reclaims their storage. It is optional and enabled via environment
//! variables:
//!
//! - `TALLY_CACHE_SWEEP_HOURS`: Interval in hours (e.g., "6")

use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use tally_core::Database;

/// Configuration for the scheduled cache sweep
#[derive(Debug, Clone)]
pub struct CacheSweepConfig {
    /// Interval between sweeps in hours
    pub interval_hours: u64,
}

impl CacheSweepConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None if sweeping is not configured (TALLY_CACHE_SWEEP_HOURS not set)
    pub fn from_env() -> Option<Self> {
        let interval_hours: u64 = std::env::var("TALLY_CACHE_SWEEP_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())?;

        if interval_hours == 0 {
            warn!("TALLY_CACHE_SWEEP_HOURS is 0, cache sweeping disabled");
            return None;
        }

        Some(Self { interval_hours })
    }
}

/// Start the cache reaper as a background task
///
/// Spawns a tokio task that runs indefinitely, deleting expired cache rows
/// at the configured interval. Correctness never depends on it running.
pub fn start_cache_reaper(db: Database, config: CacheSweepConfig) {
    info!(
        "Starting cache reaper: every {} hours",
        config.interval_hours
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.interval_hours * 3600));

        // Skip the first immediate tick - nothing has expired at startup
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match db.purge_expired_cache(chrono::Utc::now()) {
                Ok(0) => {}
                Ok(count) => {
                    info!("Cache sweep reclaimed {} expired entries", count);
                }
                Err(e) => {
                    error!("Cache sweep failed: {}", e);
                }
            }
        }
    });
}
