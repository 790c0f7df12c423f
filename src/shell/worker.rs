//! Lifecycle of the offline page shell: install, activate, intercept fetches.

use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::error::ShellError;
use super::fetcher::{AssetFetcher, AssetResponse};
use super::manifest::{cache_key, AssetManifest};
use super::storage::BucketStore;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// Bucket not populated yet
  Installing,
  /// Bucket populated, waiting for activation
  Installed,
  /// Serving fetches from the bucket
  Active,
  /// Install failed, or a different version took over the bucket namespace
  Superseded,
}

impl fmt::Display for WorkerState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      WorkerState::Installing => "installing",
      WorkerState::Installed => "installed",
      WorkerState::Active => "active",
      WorkerState::Superseded => "superseded",
    };
    write!(f, "{}", s)
  }
}

/// An intercepted request
#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub url: Url,
  /// Top-level page navigation rather than a subresource load
  pub navigate: bool,
}

/// Where an intercepted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
  Cache,
  Network,
  /// Neither could answer; the response is [`AssetResponse::network_error`]
  Error,
}

impl fmt::Display for ServedFrom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ServedFrom::Cache => write!(f, "cache"),
      ServedFrom::Network => write!(f, "network"),
      ServedFrom::Error => write!(f, "error"),
    }
  }
}

/// Manager for one version of the page shell.
pub struct ShellWorker<F: AssetFetcher> {
  manifest: AssetManifest,
  store: Arc<BucketStore>,
  fetcher: F,
  state: WorkerState,
}

impl<F: AssetFetcher> ShellWorker<F> {
  /// A fresh worker that still has to install.
  pub fn new(manifest: AssetManifest, store: Arc<BucketStore>, fetcher: F) -> Self {
    Self {
      manifest,
      store,
      fetcher,
      state: WorkerState::Installing,
    }
  }

  /// Pick up a worker whose bucket was populated by an earlier run.
  ///
  /// Active if its bucket exists, otherwise it still has to install.
  pub async fn resume(
    manifest: AssetManifest,
    store: Arc<BucketStore>,
    fetcher: F,
  ) -> Result<Self, ShellError> {
    let bucket = manifest.bucket_name();
    let exists = store.run(move |s| s.has(&bucket)).await?;

    let mut worker = Self::new(manifest, store, fetcher);
    if exists {
      worker.state = WorkerState::Active;
    }
    Ok(worker)
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  pub fn manifest(&self) -> &AssetManifest {
    &self.manifest
  }

  /// Fetch every manifest asset and store them as this version's bucket.
  ///
  /// All assets are fetched before anything is written. If any request fails
  /// or returns a non-2xx status, nothing is stored and the worker is
  /// superseded.
  pub async fn install(&mut self) -> Result<usize, ShellError> {
    if self.state != WorkerState::Installing {
      return Err(ShellError::InvalidState {
        op: "install",
        state: self.state,
      });
    }

    let bucket = self.manifest.bucket_name();
    info!(%bucket, "Installing page shell");

    match self.populate(&bucket).await {
      Ok(count) => {
        self.state = WorkerState::Installed;
        info!(%bucket, count, "Page shell installed");
        Ok(count)
      }
      Err(e) => {
        self.state = WorkerState::Superseded;
        warn!(%bucket, "Page shell install failed: {}", e);
        Err(e)
      }
    }
  }

  async fn populate(&self, bucket: &str) -> Result<usize, ShellError> {
    let urls = self.manifest.urls()?;

    let fetches = urls.iter().map(|url| async move {
      let response = self
        .fetcher
        .fetch(url)
        .await
        .map_err(|e| ShellError::InstallFailed {
          url: url.to_string(),
          source: Box::new(e),
        })?;

      if !response.is_ok() {
        return Err(ShellError::InstallFailed {
          url: url.to_string(),
          source: Box::new(ShellError::BadStatus {
            url: url.to_string(),
            status: response.status,
          }),
        });
      }

      Ok::<_, ShellError>((cache_key(url), response))
    });
    let entries = try_join_all(fetches).await?;

    let count = entries.len();
    let bucket = bucket.to_string();
    self
      .store
      .run(move |s| s.put_bucket(&bucket, &entries))
      .await?;

    Ok(count)
  }

  /// Take over: delete every other bucket that carries this app's prefix.
  ///
  /// Returns the names of the deleted buckets.
  pub async fn activate(&mut self) -> Result<Vec<String>, ShellError> {
    if !matches!(self.state, WorkerState::Installed | WorkerState::Active) {
      return Err(ShellError::InvalidState {
        op: "activate",
        state: self.state,
      });
    }

    let current = self.manifest.bucket_name();
    let prefix = self.manifest.prefix();

    let stale = self
      .store
      .run(move |s| {
        let stale: Vec<String> = s
          .keys()?
          .into_iter()
          .filter(|name| name.starts_with(&prefix) && *name != current)
          .collect();
        for name in &stale {
          s.delete(name)?;
        }
        Ok(stale)
      })
      .await?;

    for name in &stale {
      info!(bucket = %name, "Deleted stale page shell");
    }

    self.state = WorkerState::Active;
    Ok(stale)
  }

  /// Answer an intercepted request.
  ///
  /// - Not active: straight to the network
  /// - Navigation to the origin root: cached shell page first
  /// - Anything else: cache, then network
  ///
  /// Never fails; when nothing can answer the result is a network error
  /// response.
  pub async fn handle_fetch(&mut self, request: &AssetRequest) -> (AssetResponse, ServedFrom) {
    if self.state == WorkerState::Active && !self.bucket_exists().await {
      info!("Page shell bucket is gone, standing down");
      self.state = WorkerState::Superseded;
    }

    if self.state == WorkerState::Active {
      if request.navigate && self.manifest.is_origin_root(&request.url) {
        if let Ok(shell) = self.manifest.shell_url() {
          if let Some(hit) = self.lookup(&shell).await {
            return (hit, ServedFrom::Cache);
          }
        }
      }

      if let Some(hit) = self.lookup(&request.url).await {
        return (hit, ServedFrom::Cache);
      }
    }

    match self.fetcher.fetch(&request.url).await {
      Ok(response) => (response, ServedFrom::Network),
      Err(e) => {
        warn!(url = %request.url, "Asset fetch failed: {}", e);
        (AssetResponse::network_error(), ServedFrom::Error)
      }
    }
  }

  async fn bucket_exists(&self) -> bool {
    let bucket = self.manifest.bucket_name();
    match self.store.run(move |s| s.has(&bucket)).await {
      Ok(exists) => exists,
      Err(e) => {
        // Can't tell; keep serving and let lookups miss
        warn!("Failed to check page shell bucket: {}", e);
        true
      }
    }
  }

  async fn lookup(&self, url: &Url) -> Option<AssetResponse> {
    let bucket = self.manifest.bucket_name();
    let key = cache_key(url);
    match self.store.run(move |s| s.match_url(&bucket, &key)).await {
      Ok(hit) => {
        debug!(%url, hit = hit.is_some(), "Page shell lookup");
        hit
      }
      Err(e) => {
        warn!(%url, "Page shell lookup failed: {}", e);
        None
      }
    }
  }
}
