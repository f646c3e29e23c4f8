// src/error/mod.rs
//
// Error taxonomy for the sync engine

pub mod types;

pub use types::{SyncError, SyncResult};
