use super::entity::Episode;
use crate::domain::{DomainError, DomainResult};

/// Validates all Episode invariants
///
/// 1. Episode MUST belong to exactly one Show (show_id required, immutable)
/// 2. External id is positive
/// 3. Episode number starts at 1 (season 0 is valid but never synced)
/// 4. watched_at changes only through the progress-sync path
pub fn validate_episode(episode: &Episode) -> DomainResult<()> {
    if episode.trakt_id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Episode external id must be positive, got {}",
            episode.trakt_id
        )));
    }
    if episode.number == 0 {
        return Err(DomainError::InvariantViolation(
            "Episode number must be >= 1".to_string(),
        ));
    }
    Ok(())
}
