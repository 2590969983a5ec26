//! CLI command tests

use crate::commands;
use tally_core::db::Database;

fn temp_db_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("tally.db")
}

#[test]
fn test_init_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    // Re-running init is harmless
    commands::cmd_init(&path).unwrap();
}

#[test]
fn test_status_on_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);

    commands::cmd_init(&path).unwrap();
    commands::cmd_status(&path).unwrap();
}

#[test]
fn test_purge_cache_removes_expired_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);

    let db = Database::new(path.to_str().unwrap()).unwrap();
    let user = db.create_user("Test", "t@example.com", "hash").unwrap();
    let now = chrono::Utc::now();
    db.save_cached_response(user.id, "summary", "hash", "stale", chrono::Duration::zero(), now)
        .unwrap();
    assert_eq!(db.count_cache_entries().unwrap(), 1);
    drop(db);

    commands::cmd_purge_cache(&path).unwrap();

    let db = Database::new(path.to_str().unwrap()).unwrap();
    assert_eq!(db.count_cache_entries().unwrap(), 0);
}
