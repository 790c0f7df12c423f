//! SQLite-backed local store for cached records.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::error::CacheError;
use super::schema;
use super::traits::StoredRecord;

/// Local key-value store holding the cache collections.
///
/// Each collection table stores the serialized record in `data` and a
/// monotonically increasing `seq` that is bumped on every upsert, so
/// ordering by `seq` gives insertion recency.
pub struct LocalStore {
  conn: Mutex<Connection>,
}

impl LocalStore {
  /// Open the store at `path`, or `None` when local storage is unavailable.
  ///
  /// Failures are logged here; callers treat `None` as "run without a cache".
  pub fn open(path: &Path) -> Option<Self> {
    match Self::try_open(path) {
      Ok(store) => Some(store),
      Err(e) => {
        warn!("Local cache unavailable at {}: {}", path.display(), e);
        None
      }
    }
  }

  /// Open the store at `path`, creating parent directories as needed.
  pub fn try_open(path: &Path) -> Result<Self, CacheError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        warn!("Failed to create cache directory {}: {}", parent.display(), e);
        CacheError::Unavailable
      })?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Open a throwaway in-memory store.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, CacheError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(mut conn: Connection) -> Result<Self, CacheError> {
    let version = schema::migrate(&mut conn)?;
    debug!(version, "Local store ready");

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Run a store operation on the blocking pool.
  pub async fn run<F, R>(self: &Arc<Self>, op: F) -> Result<R, CacheError>
  where
    F: FnOnce(&LocalStore) -> Result<R, CacheError> + Send + 'static,
    R: Send + 'static,
  {
    let store = Arc::clone(self);
    tokio::task::spawn_blocking(move || op(&store)).await?
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    self
      .conn
      .lock()
      .map_err(|e| CacheError::Poisoned(e.to_string()))
  }

  /// Upsert `records` and then trim the collection to its cap.
  ///
  /// Records are stamped with increasing sequence numbers in slice order, so
  /// the last record in the slice is the most recent. Both steps run in one
  /// transaction and eviction only starts once every upsert is done.
  ///
  /// Returns the number of records evicted.
  pub fn put_all<T: StoredRecord>(&self, records: &[T]) -> Result<usize, CacheError> {
    let collection = T::collection();
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    let mut seq: i64 = tx.query_row(
      &format!("SELECT COALESCE(MAX(seq), 0) FROM {}", collection.name),
      [],
      |row| row.get(0),
    )?;

    {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} ({key}, data, seq) VALUES (?1, ?2, ?3)
         ON CONFLICT({key}) DO UPDATE SET data = excluded.data, seq = excluded.seq",
        table = collection.name,
        key = collection.key_column,
      ))?;

      for record in records {
        seq += 1;
        let data = serde_json::to_vec(record)?;
        stmt.execute(params![record.record_key(), data, seq])?;
      }
    }

    let evicted = tx.execute(
      &format!(
        "DELETE FROM {table} WHERE {key} NOT IN (
           SELECT {key} FROM {table} ORDER BY seq DESC LIMIT ?1
         )",
        table = collection.name,
        key = collection.key_column,
      ),
      params![collection.cap as i64],
    )?;

    tx.commit()?;

    if evicted > 0 {
      debug!(
        collection = collection.name,
        evicted, "Evicted records beyond cap of {}", collection.cap
      );
    }

    Ok(evicted)
  }

  /// Look up a single record by its key.
  pub fn get<T: StoredRecord>(&self, key: &str) -> Result<Option<T>, CacheError> {
    let collection = T::collection();
    let conn = self.lock()?;

    let data: Option<Vec<u8>> = conn
      .query_row(
        &format!(
          "SELECT data FROM {} WHERE {} = ?1",
          collection.name, collection.key_column
        ),
        params![key],
        |row| row.get(0),
      )
      .optional()?;

    match data {
      Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      None => Ok(None),
    }
  }

  /// Every record in the collection, ordered by key.
  ///
  /// Rows that no longer deserialize are skipped.
  pub fn get_all<T: StoredRecord>(&self) -> Result<Vec<T>, CacheError> {
    let collection = T::collection();
    let conn = self.lock()?;

    let mut stmt = conn.prepare(&format!(
      "SELECT data FROM {} ORDER BY {}",
      collection.name, collection.key_column
    ))?;

    let records = stmt
      .query_map([], |row| row.get::<_, Vec<u8>>(0))?
      .filter_map(|r| r.ok())
      .filter_map(|data| serde_json::from_slice(&data).ok())
      .collect();

    Ok(records)
  }

  /// Every record in the collection, most recently stored first.
  ///
  /// Rows that no longer deserialize are skipped.
  pub fn get_recent<T: StoredRecord>(&self) -> Result<Vec<T>, CacheError> {
    let collection = T::collection();
    let conn = self.lock()?;

    let mut stmt = conn.prepare(&format!(
      "SELECT data FROM {} ORDER BY seq DESC",
      collection.name
    ))?;

    let records = stmt
      .query_map([], |row| row.get::<_, Vec<u8>>(0))?
      .filter_map(|r| r.ok())
      .filter_map(|data| serde_json::from_slice(&data).ok())
      .collect();

    Ok(records)
  }

  /// Keys in the collection, most recent first.
  #[cfg(test)]
  pub fn keys_by_recency<T: StoredRecord>(&self) -> Result<Vec<String>, CacheError> {
    let collection = T::collection();
    let conn = self.lock()?;

    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM {} ORDER BY seq DESC",
      collection.key_column, collection.name
    ))?;

    let keys = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>, _>>()?;

    Ok(keys)
  }

  /// Number of records in the collection.
  pub fn count<T: StoredRecord>(&self) -> Result<usize, CacheError> {
    let collection = T::collection();
    let conn = self.lock()?;
    let n: i64 = conn.query_row(
      &format!("SELECT COUNT(*) FROM {}", collection.name),
      [],
      |row| row.get(0),
    )?;
    Ok(n as usize)
  }
}
