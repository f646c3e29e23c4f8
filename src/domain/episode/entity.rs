use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single episode belonging to a Show.
///
/// Natural secondary key within a show is `(season, number)`. `watched_at`
/// is user-owned: metadata reconciliation must never touch it; only the
/// watched-progress path may set or clear it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Reference to the owning Show (cascade-deleted with it)
    pub show_id: Uuid,

    /// Remote external id, globally unique
    pub trakt_id: i64,

    /// Season number; 0 means specials and is never synced
    pub season: u32,

    /// Episode number within the season, starting at 1
    pub number: u32,

    pub title: Option<String>,

    pub overview: Option<String>,

    /// Runtime in minutes
    pub runtime: Option<u32>,

    /// First-aired instant, absent for unannounced episodes
    pub aired_at: Option<DateTime<Utc>>,

    /// When the user watched this episode (protected field)
    pub watched_at: Option<DateTime<Utc>>,
}

impl Episode {
    /// Create a new Episode under a show.
    /// show_id MUST reference an existing show (enforced by the store).
    pub fn new(show_id: Uuid, trakt_id: i64, season: u32, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id,
            trakt_id,
            season,
            number,
            title: None,
            overview: None,
            runtime: None,
            aired_at: None,
            watched_at: None,
        }
    }

    /// `(season, number)` composite, the in-show ordering key.
    pub fn position(&self) -> (u32, u32) {
        (self.season, self.number)
    }
}
