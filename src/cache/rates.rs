//! Cache manager for conversion rates.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::types::{PairKey, RateRecord};

use super::error::CacheError;
use super::storage::LocalStore;

/// Bounded cache of directional conversion rates.
///
/// Rates are stored under their exact `FROM_TO` key. A lookup for `B_A`
/// never consults `A_B`.
#[derive(Clone)]
pub struct RateCache {
  store: Option<Arc<LocalStore>>,
}

impl RateCache {
  pub fn new(store: Option<Arc<LocalStore>>) -> Self {
    Self { store }
  }

  /// Store `rate` for the pair and trim the collection to its cap.
  pub async fn put(&self, rate: f64, from: &str, to: &str) {
    let Some(store) = &self.store else {
      return;
    };

    let record = RateRecord {
      query: PairKey::new(from, to).to_string(),
      rate,
    };
    let query = record.query.clone();

    match store.run(move |s| s.put_all(&[record])).await {
      Ok(_) => debug!(%query, rate, "Currency rate added to cache"),
      Err(e) => warn!(%query, "Failed to cache currency rate: {}", e),
    }
  }

  /// Cached rate for the exact pair.
  ///
  /// Storage faults are logged and reported as a miss.
  pub async fn get(&self, from: &str, to: &str) -> Result<f64, CacheError> {
    let query = PairKey::new(from, to).to_string();

    let Some(store) = &self.store else {
      return Err(CacheError::Miss(query));
    };

    let key = query.clone();
    match store.run(move |s| s.get::<RateRecord>(&key)).await {
      Ok(Some(record)) => Ok(record.rate),
      Ok(None) => {
        debug!(%query, "No rate found in cache");
        Err(CacheError::Miss(query))
      }
      Err(e) => {
        warn!(%query, "Failed to read cached rate: {}", e);
        Err(CacheError::Miss(query))
      }
    }
  }

  /// Cached rates, most recently stored first.
  pub async fn recent(&self) -> Vec<RateRecord> {
    let Some(store) = &self.store else {
      return Vec::new();
    };

    store
      .run(|s| s.get_recent::<RateRecord>())
      .await
      .unwrap_or_else(|e| {
        warn!("Failed to list cached rates: {}", e);
        Vec::new()
      })
  }

  /// Number of cached rates.
  pub async fn len(&self) -> usize {
    let Some(store) = &self.store else {
      return 0;
    };

    store
      .run(|s| s.count::<RateRecord>())
      .await
      .unwrap_or_else(|e| {
        warn!("Failed to count cached rates: {}", e);
        0
      })
  }
}
