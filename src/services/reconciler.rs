// src/services/reconciler.rs
//
// Per-entity merge logic: given a remote DTO and an optional existing
// local record, produce the write while preserving protected local-only
// fields. Metadata reconciliation never touches watch state; watch state
// changes only flow through `apply_watched_progress`.

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Episode, Movie, Show};
use crate::error::SyncResult;
use crate::integrations::trakt::dto::{EpisodeDto, MovieDto, ProgressDto, ShowDto};
use crate::repositories::EpisodeRepository;

/// One watch-state transition produced by a progress sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeWatchStateChange {
    pub episode_id: Uuid,
    pub season: u32,
    pub number: u32,
    pub watched_at: Option<DateTime<Utc>>,
}

/// Keep the local URL whenever the incoming one is absent or empty.
/// Remote responses without the images extension omit these fields; a
/// sync must never regress previously fetched artwork.
fn merge_protected_url(incoming: Option<String>, existing: Option<&String>) -> Option<String> {
    match incoming {
        Some(url) if !url.trim().is_empty() => Some(url),
        _ => existing.cloned(),
    }
}

pub struct Reconciler {
    episode_repo: Arc<dyn EpisodeRepository>,
}

impl Reconciler {
    pub fn new(episode_repo: Arc<dyn EpisodeRepository>) -> Self {
        Self { episode_repo }
    }

    /// Merge a remote show into a new or existing local record.
    /// Local id and created_at survive; artwork URLs are protected.
    pub fn reconcile_show(&self, existing: Option<&Show>, incoming: &ShowDto) -> Show {
        let mut show = match existing {
            Some(e) => e.clone(),
            None => Show::new(incoming.ids.trakt, incoming.title.clone()),
        };

        show.trakt_id = incoming.ids.trakt;
        show.tmdb_id = incoming.ids.tmdb.or(show.tmdb_id);
        show.title = incoming.title.clone();
        show.year = incoming.year;
        show.overview = incoming.overview.clone();
        show.runtime = incoming.runtime;
        show.status = incoming.status.clone();
        show.network = incoming.network.clone();
        show.updated_at = incoming.updated_at.or(show.updated_at);

        show.poster_url = merge_protected_url(incoming.poster_url(), show.poster_url.as_ref());
        show.backdrop_url =
            merge_protected_url(incoming.backdrop_url(), show.backdrop_url.as_ref());

        show
    }

    /// Merge a remote episode into a new or existing local record.
    /// `watched_at` is carried over from `existing` unconditionally.
    pub fn reconcile_episode(
        &self,
        existing: Option<&Episode>,
        incoming: &EpisodeDto,
        show_id: Uuid,
    ) -> Episode {
        let mut episode = match existing {
            Some(e) => e.clone(),
            None => Episode::new(show_id, incoming.ids.trakt, incoming.season, incoming.number),
        };

        episode.show_id = show_id;
        episode.trakt_id = incoming.ids.trakt;
        episode.season = incoming.season;
        episode.number = incoming.number;
        episode.title = incoming.title.clone();
        episode.overview = incoming.overview.clone();
        episode.runtime = incoming.runtime;
        episode.aired_at = incoming.first_aired;
        // episode.watched_at deliberately untouched

        episode
    }

    /// Merge a remote movie into a new or existing local record.
    /// Same protected-field rules as shows; `watched_at` is carried over.
    pub fn reconcile_movie(&self, existing: Option<&Movie>, incoming: &MovieDto) -> Movie {
        let mut movie = match existing {
            Some(e) => e.clone(),
            None => Movie::new(incoming.ids.trakt, incoming.title.clone()),
        };

        movie.trakt_id = incoming.ids.trakt;
        movie.tmdb_id = incoming.ids.tmdb.or(movie.tmdb_id);
        movie.title = incoming.title.clone();
        movie.year = incoming.year;
        movie.overview = incoming.overview.clone();
        movie.runtime = incoming.runtime;

        movie.poster_url = merge_protected_url(incoming.poster_url(), movie.poster_url.as_ref());
        movie.backdrop_url =
            merge_protected_url(incoming.backdrop_url(), movie.backdrop_url.as_ref());

        movie
    }

    /// Apply a watched-progress payload to the local episodes of a show.
    ///
    /// For every (season, number) pair in the payload: `completed == true`
    /// sets `watched_at` to the reported instant (falling back to the
    /// locally known instant, then to now); `completed == false` clears it.
    /// Episodes not present locally are skipped; progress sync never
    /// creates rows. All updates land in one transaction.
    pub fn apply_watched_progress(
        &self,
        show_id: Uuid,
        progress: &ProgressDto,
    ) -> SyncResult<Vec<EpisodeWatchStateChange>> {
        let now = Utc::now();
        let mut changes = Vec::new();

        for season in &progress.seasons {
            for entry in &season.episodes {
                let local = match self
                    .episode_repo
                    .find_by_number(show_id, season.number, entry.number)?
                {
                    Some(episode) => episode,
                    None => {
                        debug!(
                            "Skipping progress for unknown episode S{:02}E{:02} of show {}",
                            season.number, entry.number, show_id
                        );
                        continue;
                    }
                };

                let watched_at = if entry.completed {
                    Some(
                        entry
                            .last_watched_at
                            .or(local.watched_at)
                            .unwrap_or(now),
                    )
                } else {
                    None
                };

                if local.watched_at != watched_at {
                    changes.push(EpisodeWatchStateChange {
                        episode_id: local.id,
                        season: season.number,
                        number: entry.number,
                        watched_at,
                    });
                }
            }
        }

        let updates: Vec<(Uuid, Option<DateTime<Utc>>)> = changes
            .iter()
            .map(|c| (c.episode_id, c.watched_at))
            .collect();
        self.episode_repo.update_watch_states(&updates)?;

        Ok(changes)
    }
}
