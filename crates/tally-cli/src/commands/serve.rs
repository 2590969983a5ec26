//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;
use tally_server::ServerConfig;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let config = ServerConfig::from_env()?;
    if !config.allowed_origins.is_empty() {
        println!("   CORS origins: {}", config.allowed_origins.join(", "));
    }

    let db = open_db(db_path)?;

    tally_server::serve(db, host, port, config).await
}
