// src/integrations/mod.rs
//
// External collaborators: the remote media tracker and the credential
// provider. Both are traits so the sync engine can be tested against
// fakes and the host can swap implementations.

pub mod credentials;
pub mod trakt;

pub use credentials::{AccessToken, CredentialProvider, StaticTokenProvider};
pub use trakt::TraktClient;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::integrations::trakt::dto::{
    EpisodeDto, ProgressDto, SeasonDto, ShowDto, WatchedMovieDto, WatchedShowDto,
};

/// Typed façade over the remote media-tracking API.
///
/// Failure contract: `Unauthorized` is never retried internally,
/// `RateLimited` gets at most one internal retry after a fixed backoff,
/// `Decoding` marks schema drift and is a per-item failure for callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn search_shows(&self, query: &str, limit: u32) -> SyncResult<Vec<ShowDto>>;

    async fn get_show(&self, trakt_id: i64) -> SyncResult<ShowDto>;

    async fn get_seasons(&self, trakt_id: i64) -> SyncResult<Vec<SeasonDto>>;

    async fn get_episodes(&self, trakt_id: i64, season: u32) -> SyncResult<Vec<EpisodeDto>>;

    async fn get_watched_progress(&self, trakt_id: i64) -> SyncResult<ProgressDto>;

    async fn get_all_watched_shows(&self) -> SyncResult<Vec<WatchedShowDto>>;

    async fn get_watched_movies(&self) -> SyncResult<Vec<WatchedMovieDto>>;
}
