// src/db/connection.rs
//
// Database connection management
//
// The store is effectively single-writer: SQLite serializes writes on the
// database file even though many sync tasks hold pooled connections. That
// is intentional; network I/O dominates wall-clock cost per show.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Default database file path.
///
/// Path structure: {APP_DATA}/showsync/showsync.db
pub fn default_database_path() -> SyncResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| SyncError::Other("Could not determine app data directory".to_string()))?;

    let showsync_dir = app_data_dir.join("showsync");

    std::fs::create_dir_all(&showsync_dir).map_err(SyncError::Io)?;

    Ok(showsync_dir.join("showsync.db"))
}

/// Create a connection pool for the given database file.
///
/// Pool configuration:
/// - SQLite in WAL mode for better concurrency
/// - Foreign keys enabled (cascade deletes depend on this)
/// - Busy timeout set to avoid immediate errors under write contention
pub fn create_connection_pool(db_path: &Path) -> SyncResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(15)
        .build(manager)
        .map_err(|e| SyncError::StoreUnavailable(format!("Failed to create connection pool: {}", e)))?;

    Ok(pool)
}

/// Create a connection pool at the default location.
pub fn create_default_pool() -> SyncResult<ConnectionPool> {
    let db_path = default_database_path()?;
    create_connection_pool(&db_path)
}

/// Get a connection from the pool.
///
/// Pool exhaustion or a broken connection is a store-unavailable condition.
pub fn get_connection(pool: &ConnectionPool) -> SyncResult<PooledConn> {
    pool.get()
        .map_err(|e| SyncError::StoreUnavailable(format!("Failed to get database connection: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_connection_pool_creation() {
        let dir = tempdir().unwrap();
        let pool = create_connection_pool(&dir.path().join("test.db")).unwrap();
        let conn = get_connection(&pool).unwrap();

        // Verify foreign keys are enabled
        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_pool_connections_share_database() {
        let dir = tempdir().unwrap();
        let pool = create_connection_pool(&dir.path().join("test.db")).unwrap();

        let conn_a = get_connection(&pool).unwrap();
        conn_a
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (42);")
            .unwrap();
        drop(conn_a);

        let conn_b = get_connection(&pool).unwrap();
        let x: i32 = conn_b.query_row("SELECT x FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(x, 42);
    }
}
