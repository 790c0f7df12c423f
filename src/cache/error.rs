use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
  #[error("Local storage is unavailable")]
  Unavailable,

  #[error("Storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("Failed to (de)serialize record: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Storage task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("Lock poisoned: {0}")]
  Poisoned(String),

  #[error("No cached record for {0}")]
  Miss(String),
}

