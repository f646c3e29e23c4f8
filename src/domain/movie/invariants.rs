use super::entity::Movie;
use crate::domain::{DomainError, DomainResult};

/// Validates all Movie invariants
pub fn validate_movie(movie: &Movie) -> DomainResult<()> {
    if movie.trakt_id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Movie external id must be positive, got {}",
            movie.trakt_id
        )));
    }
    if movie.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Movie title must not be empty".to_string(),
        ));
    }
    Ok(())
}
