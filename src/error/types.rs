// src/error/types.rs
use crate::domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Could not obtain a store connection. Fatal: aborts a whole batch.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A uniqueness invariant was violated. Should not occur with keyed
    /// reconciliation; treated as a per-item failure when it does.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Token refresh failed. Surfaced to the host's auth flow, never
    /// retried internally.
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Rate limited by remote API")]
    RateLimited,

    #[error("Remote API returned status {0}")]
    Http(u16),

    /// Remote schema drift. Per-item failure, the batch continues.
    #[error("Failed to decode remote response: {0}")]
    Decoding(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl SyncError {
    /// Fatal errors abort an entire batch instead of being recorded as a
    /// per-item failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_))
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                SyncError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                )
            }
            _ => SyncError::Database(err),
        }
    }
}

impl From<r2d2::Error> for SyncError {
    fn from(err: r2d2::Error) -> Self {
        SyncError::StoreUnavailable(err.to_string())
    }
}

impl From<uuid::Error> for SyncError {
    fn from(err: uuid::Error) -> Self {
        SyncError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for SyncError {
    fn from(err: chrono::ParseError) -> Self {
        SyncError::Other(format!("Date parse error: {}", err))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_failures_map_to_constraint_violation() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: shows.trakt_id".to_string()),
        );
        match SyncError::from(err) {
            SyncError::ConstraintViolation(msg) => {
                assert!(msg.contains("trakt_id"));
            }
            other => panic!("expected ConstraintViolation, got {:?}", other),
        }
    }

    #[test]
    fn only_store_unavailable_is_fatal() {
        assert!(SyncError::StoreUnavailable("pool timed out".into()).is_fatal());
        assert!(!SyncError::RateLimited.is_fatal());
        assert!(!SyncError::NotFound.is_fatal());
        assert!(!SyncError::Http(500).is_fatal());
    }
}
