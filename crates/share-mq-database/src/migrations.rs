//! Database migrations.
//!
//! Migrations run in order and are tracked in the `migrations` table.

use crate::DatabaseResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version >= CURRENT_VERSION {
        debug!(current_version, "Schema up to date");
        return Ok(());
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_share_mq(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: outbound share request queue.
fn migrate_v1_share_mq(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v1: share_mq");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS share_mq (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            data TEXT NOT NULL,
            protocol TEXT NOT NULL DEFAULT '',
            uid TEXT NOT NULL,
            tries INTEGER NOT NULL DEFAULT 0 CHECK (tries >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_share_mq_tries
            ON share_mq(tries, id);
        ",
    )?;

    record_migration(conn, 1, "share_mq")?;
    Ok(())
}
