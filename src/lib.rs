// src/lib.rs
//
// showsync: incremental synchronization engine for a locally tracked
// show and movie library against a remote media-tracking service.
//
// Layering, outermost first:
//   services      orchestration (batch sync, reconciliation, up-next)
//   integrations  remote HTTP client and credential provider
//   repositories  SQLite persistence behind trait seams
//   domain        entities, invariants, derived projections
//   db            connection pool and schema migrations
//   error         one error type for the whole crate

pub mod db;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod repositories;
pub mod services;

pub use db::{create_connection_pool, create_default_pool, initialize_database, ConnectionPool};
pub use domain::{Episode, Movie, NextEpisode, Show, UpNextItem, UpNextSort, WatchedProgress};
pub use error::{SyncError, SyncResult};
pub use integrations::{AccessToken, CredentialProvider, RemoteClient, TraktClient};
pub use repositories::{
    EpisodeRepository, MovieRepository, ShowRepository, SqliteEpisodeRepository,
    SqliteMovieRepository, SqliteShowRepository,
};
pub use services::{
    BatchResult, Reconciler, SyncOptions, SyncPhase, SyncProgress, SyncService, UpNextService,
};
