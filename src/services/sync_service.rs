// src/services/sync_service.rs
//
// Batch sync orchestrator: fans per-show pipelines out over a bounded
// pool of tokio tasks, aggregates per-show outcomes, and reports phase
// transitions through an optional callback.

use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::domain::{validate_episode, validate_movie, validate_show};
use crate::error::{SyncError, SyncResult};
use crate::integrations::RemoteClient;
use crate::repositories::{EpisodeRepository, MovieRepository, ShowRepository};
use crate::services::reconciler::Reconciler;

/// Where a show currently is in its sync pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    FetchingSeasons,
    SyncingEpisodes { season: u32 },
    SyncingProgress,
    Completed,
}

/// Snapshot handed to the progress callback. `completed` counts shows
/// that finished (successfully or not) out of `total`.
#[derive(Debug, Clone, Copy)]
pub struct SyncProgress {
    pub completed: usize,
    pub total: usize,
    pub phase: SyncPhase,
}

pub type ProgressCallback = dyn Fn(SyncProgress) + Send + Sync;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub max_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Outcome of a batch run. Per-show failures are collected here instead
/// of aborting the batch; only a fatal store error aborts.
#[derive(Debug)]
pub struct BatchResult {
    pub total_shows: usize,
    pub success_count: usize,
    pub failed_shows: Vec<(Uuid, SyncError)>,
    pub total_episodes_synced: usize,
}

/// Serializes progress emissions so callers observe a consistent
/// completed/total pair even with concurrent show tasks.
struct ProgressReporter {
    inner: std::sync::Mutex<ProgressState>,
}

struct ProgressState {
    completed: usize,
    total: usize,
    callback: Option<Arc<ProgressCallback>>,
}

impl ProgressReporter {
    fn new(total: usize, callback: Option<Arc<ProgressCallback>>) -> Self {
        Self {
            inner: std::sync::Mutex::new(ProgressState {
                completed: 0,
                total,
                callback,
            }),
        }
    }

    fn phase(&self, phase: SyncPhase) {
        let state = self.inner.lock().unwrap();
        if let Some(callback) = &state.callback {
            callback(SyncProgress {
                completed: state.completed,
                total: state.total,
                phase,
            });
        }
    }

    fn show_finished(&self) {
        let mut state = self.inner.lock().unwrap();
        state.completed += 1;
        if let Some(callback) = &state.callback {
            callback(SyncProgress {
                completed: state.completed,
                total: state.total,
                phase: SyncPhase::Completed,
            });
        }
    }
}

#[derive(Clone)]
pub struct SyncService {
    show_repo: Arc<dyn ShowRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    movie_repo: Arc<dyn MovieRepository>,
    client: Arc<dyn RemoteClient>,
    reconciler: Arc<Reconciler>,
}

impl SyncService {
    pub fn new(
        show_repo: Arc<dyn ShowRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
        movie_repo: Arc<dyn MovieRepository>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&episode_repo)));
        Self {
            show_repo,
            episode_repo,
            movie_repo,
            client,
            reconciler,
        }
    }

    /// Fetch a show by its remote id and upsert it locally, keyed by
    /// `trakt_id` so repeated imports reuse the existing row.
    pub async fn import_show(&self, trakt_id: i64) -> SyncResult<Uuid> {
        let incoming = self.client.get_show(trakt_id).await?;
        let existing = self.show_repo.find_by_trakt_id(trakt_id)?;
        let merged = self.reconciler.reconcile_show(existing.as_ref(), &incoming);
        validate_show(&merged)?;
        self.show_repo.save(&merged)?;

        info!("Imported show '{}' ({})", merged.title, merged.id);
        Ok(merged.id)
    }

    /// Run the full sync pipeline for each of `show_ids` with bounded
    /// concurrency. Duplicate ids are synced once. A failing show is
    /// recorded in the result and never blocks its siblings; a fatal
    /// store error aborts the whole batch.
    ///
    /// Dropping the returned future aborts in-flight work at the next
    /// await point; store writes already inside a transaction complete.
    pub async fn sync_shows(
        &self,
        show_ids: Vec<Uuid>,
        options: SyncOptions,
        on_progress: Option<Arc<ProgressCallback>>,
    ) -> SyncResult<BatchResult> {
        let mut seen = HashSet::new();
        let show_ids: Vec<Uuid> = show_ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let total = show_ids.len();
        let reporter = Arc::new(ProgressReporter::new(total, on_progress));
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));

        let mut tasks = JoinSet::new();
        let mut task_shows: HashMap<tokio::task::Id, Uuid> = HashMap::new();

        for show_id in show_ids {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let reporter = Arc::clone(&reporter);

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SyncError::Other(format!("Concurrency limiter closed: {}", e)))?;
                let outcome = service.sync_show(show_id, &reporter).await;
                reporter.show_finished();
                outcome
            });
            task_shows.insert(handle.id(), show_id);
        }

        let mut result = BatchResult {
            total_shows: total,
            success_count: 0,
            failed_shows: Vec::new(),
            total_episodes_synced: 0,
        };

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, Ok(episodes))) => {
                    result.success_count += 1;
                    result.total_episodes_synced += episodes;
                }
                Ok((task_id, Err(err))) => {
                    let show_id = task_shows.get(&task_id).copied().unwrap_or(Uuid::nil());
                    if err.is_fatal() {
                        warn!("Aborting batch sync, store unavailable: {}", err);
                        return Err(err);
                    }
                    warn!("Sync failed for show {}: {}", show_id, err);
                    result.failed_shows.push((show_id, err));
                }
                Err(join_err) => {
                    let show_id = task_shows
                        .get(&join_err.id())
                        .copied()
                        .unwrap_or(Uuid::nil());
                    warn!("Sync task for show {} did not finish: {}", show_id, join_err);
                    result
                        .failed_shows
                        .push((show_id, SyncError::Other(join_err.to_string())));
                }
            }
        }

        info!(
            "Batch sync finished: {}/{} shows ok, {} episodes written",
            result.success_count, result.total_shows, result.total_episodes_synced
        );
        Ok(result)
    }

    /// One show's pipeline: refresh metadata, list seasons, sync each
    /// regular season's episodes in its own transaction, then apply
    /// remote watched progress. Returns the number of episodes written.
    async fn sync_show(&self, show_id: Uuid, reporter: &ProgressReporter) -> SyncResult<usize> {
        let show = self
            .show_repo
            .get_by_id(show_id)?
            .ok_or(SyncError::NotFound)?;

        reporter.phase(SyncPhase::FetchingSeasons);

        let incoming = self.client.get_show(show.trakt_id).await?;
        let merged = self.reconciler.reconcile_show(Some(&show), &incoming);
        validate_show(&merged)?;
        self.show_repo.save(&merged)?;

        let seasons = self.client.get_seasons(show.trakt_id).await?;

        let mut episodes_synced = 0;
        // Season 0 holds specials; they never enter the store
        for season in seasons.iter().filter(|s| s.number > 0) {
            reporter.phase(SyncPhase::SyncingEpisodes {
                season: season.number,
            });

            let dtos = self.client.get_episodes(show.trakt_id, season.number).await?;

            let mut batch = Vec::with_capacity(dtos.len());
            for dto in &dtos {
                let existing = self.episode_repo.find_by_number(show_id, dto.season, dto.number)?;
                let episode = self.reconciler.reconcile_episode(existing.as_ref(), dto, show_id);
                validate_episode(&episode)?;
                batch.push(episode);
            }

            self.episode_repo.save_batch(&batch)?;
            episodes_synced += batch.len();
        }

        reporter.phase(SyncPhase::SyncingProgress);

        let progress = self.client.get_watched_progress(show.trakt_id).await?;
        self.reconciler.apply_watched_progress(show_id, &progress)?;

        Ok(episodes_synced)
    }

    /// Pull the remote watched-shows list, import any show not yet in
    /// the store, then batch-sync all of them.
    pub async fn sync_all_watched(
        &self,
        options: SyncOptions,
        on_progress: Option<Arc<ProgressCallback>>,
    ) -> SyncResult<BatchResult> {
        let watched = self.client.get_all_watched_shows().await?;
        info!("Remote watched list has {} shows", watched.len());

        let mut show_ids = Vec::with_capacity(watched.len());
        for entry in &watched {
            let trakt_id = entry.show.ids.trakt;
            let id = match self.show_repo.find_by_trakt_id(trakt_id)? {
                Some(show) => show.id,
                None => {
                    let merged = self.reconciler.reconcile_show(None, &entry.show);
                    validate_show(&merged)?;
                    self.show_repo.save(&merged)?;
                    merged.id
                }
            };
            show_ids.push(id);
        }

        self.sync_shows(show_ids, options, on_progress).await
    }

    /// Pull the remote watched-movies list and upsert every entry.
    /// A remote watch instant wins; otherwise the local one is kept.
    pub async fn sync_watched_movies(&self) -> SyncResult<usize> {
        let watched = self.client.get_watched_movies().await?;

        let mut batch = Vec::with_capacity(watched.len());
        for entry in &watched {
            let existing = self.movie_repo.find_by_trakt_id(entry.movie.ids.trakt)?;
            let mut movie = self.reconciler.reconcile_movie(existing.as_ref(), &entry.movie);
            movie.watched_at = entry.last_watched_at.or(movie.watched_at);
            validate_movie(&movie)?;
            batch.push(movie);
        }

        self.movie_repo.save_batch(&batch)?;
        info!("Synced {} watched movies", batch.len());
        Ok(batch.len())
    }
}
