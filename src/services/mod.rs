// src/services/mod.rs
//
// Service layer: the reconciler merges remote state into local state,
// the sync service orchestrates batch synchronization, and the up-next
// service projects what to watch next.

pub mod reconciler;
pub mod sync_service;
pub mod up_next_service;

pub use reconciler::{EpisodeWatchStateChange, Reconciler};
pub use sync_service::{
    BatchResult, ProgressCallback, SyncOptions, SyncPhase, SyncProgress, SyncService,
};
pub use up_next_service::UpNextService;

#[cfg(test)]
mod sync_service_tests;
