//! SQLite-backed bucket storage for page assets.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::ShellError;
use super::fetcher::AssetResponse;

/// Schema for asset buckets.
const BUCKET_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS buckets (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bucket_entries (
    bucket TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    PRIMARY KEY (bucket, url)
);
"#;

/// Named buckets of cached responses, keyed by URL.
pub struct BucketStore {
  conn: Mutex<Connection>,
}

impl BucketStore {
  /// Open the bucket store at `path`, creating parent directories as needed.
  pub fn open(path: &Path) -> Result<Self, ShellError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    Self::with_connection(Connection::open(path)?)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, ShellError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, ShellError> {
    conn.execute_batch(BUCKET_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Run a store operation on the blocking pool.
  pub async fn run<F, R>(self: &Arc<Self>, op: F) -> Result<R, ShellError>
  where
    F: FnOnce(&BucketStore) -> Result<R, ShellError> + Send + 'static,
    R: Send + 'static,
  {
    let store = Arc::clone(self);
    tokio::task::spawn_blocking(move || op(&store)).await?
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, ShellError> {
    self
      .conn
      .lock()
      .map_err(|e| ShellError::Poisoned(e.to_string()))
  }

  /// Names of every bucket.
  pub fn keys(&self) -> Result<Vec<String>, ShellError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY name")?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
  }

  pub fn has(&self, bucket: &str) -> Result<bool, ShellError> {
    let conn = self.lock()?;
    let found: Option<i64> = conn
      .query_row(
        "SELECT 1 FROM buckets WHERE name = ?",
        params![bucket],
        |row| row.get(0),
      )
      .optional()?;
    Ok(found.is_some())
  }

  /// When `bucket` was last written, if it exists.
  pub fn created_at(&self, bucket: &str) -> Result<Option<DateTime<Utc>>, ShellError> {
    let conn = self.lock()?;
    let stamp: Option<String> = conn
      .query_row(
        "SELECT created_at FROM buckets WHERE name = ?",
        params![bucket],
        |row| row.get(0),
      )
      .optional()?;

    Ok(stamp.and_then(|s| {
      DateTime::parse_from_rfc3339(&s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
    }))
  }

  /// Replace the contents of `bucket` with `entries` in a single transaction.
  ///
  /// Either every entry lands or the bucket is left as it was.
  pub fn put_bucket(
    &self,
    bucket: &str,
    entries: &[(String, AssetResponse)],
  ) -> Result<(), ShellError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    tx.execute(
      "DELETE FROM bucket_entries WHERE bucket = ?",
      params![bucket],
    )?;
    tx.execute(
      "INSERT OR REPLACE INTO buckets (name, created_at) VALUES (?, ?)",
      params![bucket, Utc::now().to_rfc3339()],
    )?;

    {
      let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO bucket_entries (bucket, url, status, content_type, body)
         VALUES (?, ?, ?, ?, ?)",
      )?;
      for (url, response) in entries {
        stmt.execute(params![
          bucket,
          url,
          response.status,
          response.content_type,
          response.body
        ])?;
      }
    }

    tx.commit()?;
    Ok(())
  }

  /// Delete a bucket and its entries. Returns false if it didn't exist.
  pub fn delete(&self, bucket: &str) -> Result<bool, ShellError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    tx.execute(
      "DELETE FROM bucket_entries WHERE bucket = ?",
      params![bucket],
    )?;
    let removed = tx.execute("DELETE FROM buckets WHERE name = ?", params![bucket])?;
    tx.commit()?;
    Ok(removed > 0)
  }

  /// Cached response for `url` in `bucket`.
  pub fn match_url(&self, bucket: &str, url: &str) -> Result<Option<AssetResponse>, ShellError> {
    let conn = self.lock()?;
    let response = conn
      .query_row(
        "SELECT status, content_type, body FROM bucket_entries
         WHERE bucket = ? AND url = ?",
        params![bucket, url],
        |row| {
          Ok(AssetResponse {
            status: row.get(0)?,
            content_type: row.get(1)?,
            body: row.get(2)?,
          })
        },
      )
      .optional()?;
    Ok(response)
  }

  /// Number of entries in `bucket`.
  pub fn entry_count(&self, bucket: &str) -> Result<usize, ShellError> {
    let conn = self.lock()?;
    let n: i64 = conn.query_row(
      "SELECT COUNT(*) FROM bucket_entries WHERE bucket = ?",
      params![bucket],
      |row| row.get(0),
    )?;
    Ok(n as usize)
  }
}
