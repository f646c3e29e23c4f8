// src/repositories/mod.rs
//
// Repository layer
//
// Repositories are dumb data mappers: explicit SQL only, no business
// logic, no invariant enforcement beyond what the schema itself carries,
// no cross-repository calls. Batch operations run in a single transaction;
// that transaction is the write boundary higher layers compose against.

pub mod episode_repository;
pub mod movie_repository;
pub mod show_repository;

pub use episode_repository::{EpisodeRepository, SqliteEpisodeRepository, WatchedStats};
pub use movie_repository::{MovieRepository, SqliteMovieRepository};
pub use show_repository::{ShowRepository, SqliteShowRepository};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Map a stored UUID string back to a Uuid with an explicit error.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Map a stored RFC 3339 string back to a UTC instant with an explicit error.
pub(crate) fn parse_instant(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::db::{create_connection_pool, get_connection, initialize_database, ConnectionPool};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Fresh migrated store on a temp file. Keep the TempDir alive for the
    /// duration of the test.
    pub(crate) fn test_pool() -> (TempDir, Arc<ConnectionPool>) {
        let dir = TempDir::new().unwrap();
        let pool = create_connection_pool(&dir.path().join("test.db")).unwrap();
        let conn = get_connection(&pool).unwrap();
        initialize_database(&conn).unwrap();
        (dir, Arc::new(pool))
    }
}
