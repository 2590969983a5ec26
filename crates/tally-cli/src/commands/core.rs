//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Open the database, running migrations as needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Set TALLY_JWT_SECRET to a long random string");
    println!("  2. Start the server: tally serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;

    println!("📊 Tally status ({})", db_path.display());
    println!("   Users:           {}", db.count_users()?);
    println!("   Transactions:    {}", db.count_transactions()?);
    println!("   Cached AI texts: {}", db.count_cache_entries()?);
    println!("   Chat messages:   {}", db.count_chat_messages()?);

    Ok(())
}

pub fn cmd_purge_cache(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;

    let purged = db
        .purge_expired_cache(chrono::Utc::now())
        .context("Failed to purge cache")?;

    println!("🧹 Removed {} expired cache entr{}", purged, if purged == 1 { "y" } else { "ies" });

    Ok(())
}
