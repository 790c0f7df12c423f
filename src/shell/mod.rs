//! Offline page shell.
//!
//! A versioned bucket of static page assets with its own lifecycle:
//! - install fetches the whole manifest and stores it atomically
//! - activate deletes buckets left behind by other versions
//! - fetch interception serves from the bucket and falls back to the network

mod error;
mod fetcher;
mod manifest;
mod storage;
mod worker;

pub use fetcher::HttpAssetFetcher;
pub use manifest::AssetManifest;
pub use storage::BucketStore;
pub use worker::{AssetRequest, ShellWorker, WorkerState};
