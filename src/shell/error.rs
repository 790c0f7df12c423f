use thiserror::Error;

use super::worker::WorkerState;

#[derive(Error, Debug)]
pub enum ShellError {
  #[error("Asset storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("Asset storage task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Lock poisoned: {0}")]
  Poisoned(String),

  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("Invalid asset URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("Fetching {url} returned status {status}")]
  BadStatus { url: String, status: u16 },

  #[error("Install aborted, failed to cache {url}: {source}")]
  InstallFailed {
    url: String,
    #[source]
    source: Box<ShellError>,
  },

  #[error("Cannot {op} while {state}")]
  InvalidState { op: &'static str, state: WorkerState },
}
