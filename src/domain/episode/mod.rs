pub mod entity;
pub mod invariants;

pub use entity::Episode;
pub use invariants::validate_episode;
