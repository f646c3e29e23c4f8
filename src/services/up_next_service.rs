// src/services/up_next_service.rs
//
// Up-next projection: for every tracked show, pick the single episode
// the viewer should watch next and pair it with watch progress. Computed
// on demand from the store; a sync that changes watch state is reflected
// on the next call.

use chrono::{DateTime, Utc};
use log::debug;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Episode, NextEpisode, UpNextItem, UpNextSort, WatchedProgress};
use crate::error::SyncResult;
use crate::repositories::{EpisodeRepository, ShowRepository};

pub struct UpNextService {
    show_repo: Arc<dyn ShowRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
}

impl UpNextService {
    pub fn new(
        show_repo: Arc<dyn ShowRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
    ) -> Self {
        Self {
            show_repo,
            episode_repo,
        }
    }

    /// Choose the next episode for one show.
    ///
    /// Candidates are the aired-but-unwatched episodes in `(season,
    /// number)` order. With no watch history the first candidate wins.
    /// Otherwise it is the first candidate after the last watched
    /// position; if everything unwatched sits before that position
    /// (gap-filling), fall back to the first candidate.
    fn next_episode(&self, show_id: Uuid, now: DateTime<Utc>) -> SyncResult<Option<Episode>> {
        let candidates = self.episode_repo.list_unwatched_aired(show_id, now)?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let chosen = match self.episode_repo.last_watched(show_id)? {
            Some(last) => candidates
                .iter()
                .find(|e| e.position() > last.position())
                .unwrap_or(&candidates[0]),
            None => &candidates[0],
        };

        Ok(Some(chosen.clone()))
    }

    /// Watch progress for one show, including its next episode.
    pub fn watched_progress(&self, show_id: Uuid) -> SyncResult<WatchedProgress> {
        let stats = self.episode_repo.watched_stats(show_id)?;
        let next = self.next_episode(show_id, Utc::now())?;

        Ok(WatchedProgress {
            show_id,
            total_episodes: stats.total,
            watched_episodes: stats.watched,
            last_watched_at: stats.last_watched_at,
            next_episode: next.as_ref().map(NextEpisode::from),
        })
    }

    /// Build the up-next item set across all tracked shows. Shows with
    /// nothing aired and unwatched contribute no item. The default order
    /// is by the chosen episode's aired instant, ascending.
    pub fn compute_up_next(&self) -> SyncResult<Vec<UpNextItem>> {
        let now = Utc::now();
        let mut items = Vec::new();

        for show in self.show_repo.list_all()? {
            let episode = match self.next_episode(show.id, now)? {
                Some(episode) => episode,
                None => continue,
            };

            let stats = self.episode_repo.watched_stats(show.id)?;
            let progress = WatchedProgress {
                show_id: show.id,
                total_episodes: stats.total,
                watched_episodes: stats.watched,
                last_watched_at: stats.last_watched_at,
                next_episode: Some(NextEpisode::from(&episode)),
            };

            items.push(UpNextItem {
                show,
                episode,
                progress: Some(progress),
            });
        }

        debug!("Up-next set has {} items", items.len());
        Self::sort_items(&mut items, UpNextSort::AiredAt);
        Ok(items)
    }

    /// Resort an item set in place. Every order is a pure permutation of
    /// the same items.
    pub fn sort_items(items: &mut [UpNextItem], sort: UpNextSort) {
        match sort {
            UpNextSort::AiredAt => {
                items.sort_by(|a, b| match (a.episode.aired_at, b.episode.aired_at) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });
            }
            UpNextSort::Title => {
                items.sort_by_key(|item| item.show.title.to_lowercase());
            }
            UpNextSort::EpisodeNumber => {
                items.sort_by_key(|item| item.episode.position());
            }
            UpNextSort::Progress => {
                items.sort_by(|a, b| {
                    let pa = a.progress.as_ref().map(|p| p.percentage()).unwrap_or(0.0);
                    let pb = b.progress.as_ref().map(|p| p.percentage()).unwrap_or(0.0);
                    pb.total_cmp(&pa)
                });
            }
        }
    }
}
