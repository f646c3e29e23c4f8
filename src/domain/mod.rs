// src/domain/mod.rs
//
// Domain root: entities, invariants, and derived projections.
// All other modules import from `crate::domain::*`.

pub mod episode;
pub mod movie;
pub mod progress;
pub mod show;

pub use show::{validate_show, Show};

pub use episode::{validate_episode, Episode};

pub use movie::{validate_movie, Movie};

// Derived data (computed on demand, never stored)
pub use progress::{NextEpisode, UpNextItem, UpNextSort, WatchedProgress};

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
