// src/domain/progress.rs
//
// Derived projections: watch progress per show and the up-next item set.
// Computed on demand from Episode rows, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Episode, Show};

/// Projection of the single episode a show should surface as
/// "next to watch".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextEpisode {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    pub aired_at: Option<DateTime<Utc>>,
}

impl From<&Episode> for NextEpisode {
    fn from(episode: &Episode) -> Self {
        Self {
            season: episode.season,
            number: episode.number,
            title: episode.title.clone(),
            aired_at: episode.aired_at,
        }
    }
}

/// Watch progress for a single show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedProgress {
    pub show_id: Uuid,
    pub total_episodes: u32,
    pub watched_episodes: u32,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub next_episode: Option<NextEpisode>,
}

impl WatchedProgress {
    /// Percentage of episodes watched, 0.0 when the show has no episodes.
    pub fn percentage(&self) -> f32 {
        if self.total_episodes == 0 {
            return 0.0;
        }
        (self.watched_episodes as f32 / self.total_episodes as f32) * 100.0
    }
}

/// Pairing of a show with its next-to-watch episode.
/// Identity is `(show.id, episode.id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpNextItem {
    pub show: Show,
    pub episode: Episode,
    pub progress: Option<WatchedProgress>,
}

impl PartialEq for UpNextItem {
    fn eq(&self, other: &Self) -> bool {
        self.show.id == other.show.id && self.episode.id == other.episode.id
    }
}

impl Eq for UpNextItem {}

/// Sort orders offered for the up-next item set.
/// All of these are pure resorts of the same items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpNextSort {
    /// By the chosen episode's aired instant, ascending; unaired last
    AiredAt,
    /// By show title, case-insensitive
    Title,
    /// By `(season, number)` composite
    EpisodeNumber,
    /// By progress percentage, descending; shows without progress last
    Progress,
}
