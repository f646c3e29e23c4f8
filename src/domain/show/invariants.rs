use super::entity::Show;
use crate::domain::{DomainError, DomainResult};

/// Validates all Show invariants
pub fn validate_show(show: &Show) -> DomainResult<()> {
    if show.trakt_id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Show external id must be positive, got {}",
            show.trakt_id
        )));
    }
    if show.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Show title must not be empty".to_string(),
        ));
    }
    Ok(())
}
