// src/db/migrations.rs
//
// Database schema initialization and migrations
//
// Migrations are forward-only and replayable against a fresh store. Each
// version is applied at most once; re-running initialization is a no-op.

use crate::error::{SyncError, SyncResult};
use log::info;
use rusqlite::Connection;

/// Current schema version.
/// Increment this when adding migrations.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
///
/// 1. Checks current schema version
/// 2. Applies necessary migrations in order
/// 3. Updates version tracking
///
/// Safe to call multiple times (idempotent).
pub fn initialize_database(conn: &Connection) -> SyncResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        apply_initial_schema(conn)?;
        set_schema_version(conn, 1)?;
        info!("Applied initial schema (version 1)");
    } else if current_version < CURRENT_SCHEMA_VERSION {
        // Future incremental migrations go here, applied in version order.
        return Err(SyncError::Other(format!(
            "Store schema is at version {} but this build expects {}; no upgrade path is defined yet",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    } else if current_version > CURRENT_SCHEMA_VERSION {
        return Err(SyncError::Other(format!(
            "Store schema version {} was written by a newer build; this one supports up to {}",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Get current schema version.
/// Returns 0 if schema_version table doesn't exist (fresh database).
fn get_schema_version(conn: &Connection) -> SyncResult<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;

    Ok(version.unwrap_or(0))
}

/// Set schema version
fn set_schema_version(conn: &Connection, version: i32) -> SyncResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )?;

    Ok(())
}

/// Apply initial schema (version 1)
fn apply_initial_schema(conn: &Connection) -> SyncResult<()> {
    let schema = include_str!("../../schema.sql");

    conn.execute_batch(schema)
        .map_err(|e| SyncError::Other(format!("Failed to apply initial schema: {}", e)))?;

    Ok(())
}
