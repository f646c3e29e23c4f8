use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked movie. Independent lifecycle from shows; the same
/// protected-field rules apply to `watched_at` and the artwork URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Remote external id, globally unique and immutable
    pub trakt_id: i64,

    /// Content-DB cross-reference id
    pub tmdb_id: Option<i64>,

    pub title: String,

    pub year: Option<i32>,

    pub overview: Option<String>,

    /// Runtime in minutes
    pub runtime: Option<u32>,

    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,

    /// When the user watched this movie (protected field)
    pub watched_at: Option<DateTime<Utc>>,
}

impl Movie {
    pub fn new(trakt_id: i64, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            trakt_id,
            tmdb_id: None,
            title,
            year: None,
            overview: None,
            runtime: None,
            poster_url: None,
            backdrop_url: None,
            watched_at: None,
        }
    }
}
