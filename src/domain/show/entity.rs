use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked TV show.
///
/// Identity is the pair `(id, trakt_id)`: `id` is the local immutable key,
/// `trakt_id` is the remote service's immutable identifier and the
/// reconciliation key. `poster_url` and `backdrop_url` are protected fields:
/// once fetched they are never regressed to null by a remote response that
/// omits the images extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Remote external id, globally unique and immutable once assigned
    pub trakt_id: i64,

    /// Content-DB cross-reference id, used for image lookups
    pub tmdb_id: Option<i64>,

    pub title: String,

    pub year: Option<i32>,

    pub overview: Option<String>,

    /// Typical episode runtime in minutes
    pub runtime: Option<u32>,

    /// Airing status as reported by the remote (e.g. "returning series")
    pub status: Option<String>,

    pub network: Option<String>,

    /// Cached artwork (protected fields)
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,

    /// Last remote-side modification instant
    pub updated_at: Option<DateTime<Utc>>,

    /// First successful import instant (local)
    pub created_at: DateTime<Utc>,
}

impl Show {
    /// Create a new Show from its identity and title.
    /// Remaining metadata is filled in by reconciliation.
    pub fn new(trakt_id: i64, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            trakt_id,
            tmdb_id: None,
            title,
            year: None,
            overview: None,
            runtime: None,
            status: None,
            network: None,
            poster_url: None,
            backdrop_url: None,
            updated_at: None,
            created_at: Utc::now(),
        }
    }
}
