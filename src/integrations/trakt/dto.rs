// src/integrations/trakt/dto.rs
//
// Wire DTOs for the media-tracking REST API. These mirror the remote
// schema and never touch domain entities directly; the reconciler maps
// them into the store. Unknown fields are ignored so schema additions on
// the remote side do not break decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External id block attached to every remote entity. `trakt` is the
/// stable reconciliation key; the rest are content-DB cross-references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdsDto {
    pub trakt: i64,
    #[serde(default)]
    pub tmdb: Option<i64>,
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub tvdb: Option<i64>,
}

/// Artwork extension. Only present when the request asked for images;
/// a response without it must never regress locally cached URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesDto {
    #[serde(default)]
    pub poster: Vec<String>,
    #[serde(default)]
    pub fanart: Vec<String>,
}

/// Image URLs come back host-relative; normalize to https.
fn full_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

impl ImagesDto {
    pub fn poster_url(&self) -> Option<String> {
        self.poster.first().map(|p| full_url(p))
    }

    pub fn fanart_url(&self) -> Option<String> {
        self.fanart.first().map(|f| full_url(f))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowDto {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub ids: IdsDto,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Option<ImagesDto>,
}

impl ShowDto {
    pub fn poster_url(&self) -> Option<String> {
        self.images.as_ref().and_then(|i| i.poster_url())
    }

    pub fn backdrop_url(&self) -> Option<String> {
        self.images.as_ref().and_then(|i| i.fanart_url())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDto {
    pub number: u32,
    #[serde(default)]
    pub ids: IdsDto,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub aired_episodes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDto {
    pub season: u32,
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    pub ids: IdsDto,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub first_aired: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDto {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub ids: IdsDto,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub images: Option<ImagesDto>,
}

impl MovieDto {
    pub fn poster_url(&self) -> Option<String> {
        self.images.as_ref().and_then(|i| i.poster_url())
    }

    pub fn backdrop_url(&self) -> Option<String> {
        self.images.as_ref().and_then(|i| i.fanart_url())
    }
}

/// Watched-progress payload: nested seasons → episodes with a completed
/// flag and an optional watch instant per episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDto {
    #[serde(default)]
    pub aired: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seasons: Vec<ProgressSeasonDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSeasonDto {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<ProgressEpisodeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEpisodeDto {
    pub number: u32,
    pub completed: bool,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// Entry of the remote watched-shows list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedShowDto {
    pub show: ShowDto,
    #[serde(default)]
    pub plays: Option<u32>,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// Entry of the remote watched-movies list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedMovieDto {
    pub movie: MovieDto,
    #[serde(default)]
    pub plays: Option<u32>,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// Search result wrapper; only show hits carry a `show` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultDto {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub show: Option<ShowDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_show_with_images() {
        let json = r#"{
            "title": "Breaking Bad",
            "year": 2008,
            "ids": { "trakt": 1388, "tmdb": 1396, "imdb": "tt0903747", "tvdb": 81189 },
            "overview": "A chemistry teacher...",
            "runtime": 45,
            "status": "ended",
            "network": "AMC",
            "updated_at": "2023-04-01T10:00:00.000Z",
            "images": {
                "poster": ["walter-white.example/poster.jpg"],
                "fanart": ["https://walter-white.example/fanart.jpg"]
            }
        }"#;

        let show: ShowDto = serde_json::from_str(json).unwrap();
        assert_eq!(show.ids.trakt, 1388);
        assert_eq!(
            show.poster_url().as_deref(),
            Some("https://walter-white.example/poster.jpg")
        );
        assert_eq!(
            show.backdrop_url().as_deref(),
            Some("https://walter-white.example/fanart.jpg")
        );
    }

    #[test]
    fn test_decode_show_without_images_extension() {
        let json = r#"{
            "title": "Breaking Bad",
            "ids": { "trakt": 1388 }
        }"#;

        let show: ShowDto = serde_json::from_str(json).unwrap();
        assert!(show.poster_url().is_none());
        assert!(show.year.is_none());
    }

    #[test]
    fn test_decode_progress_payload() {
        let json = r#"{
            "aired": 8,
            "completed": 6,
            "last_watched_at": "2021-06-17T05:05:41.000Z",
            "seasons": [
                {
                    "number": 1,
                    "episodes": [
                        { "number": 1, "completed": true, "last_watched_at": "2021-06-10T05:05:41.000Z" },
                        { "number": 2, "completed": false }
                    ]
                }
            ]
        }"#;

        let progress: ProgressDto = serde_json::from_str(json).unwrap();
        assert_eq!(progress.completed, 6);
        assert_eq!(progress.seasons.len(), 1);
        let episodes = &progress.seasons[0].episodes;
        assert!(episodes[0].completed);
        assert!(episodes[0].last_watched_at.is_some());
        assert!(!episodes[1].completed);
        assert!(episodes[1].last_watched_at.is_none());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{
            "season": 1,
            "number": 3,
            "ids": { "trakt": 73642 },
            "some_future_field": { "nested": true }
        }"#;

        let episode: EpisodeDto = serde_json::from_str(json).unwrap();
        assert_eq!(episode.number, 3);
    }
}
