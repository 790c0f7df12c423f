//! Cache manager for the currency list.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::types::CurrencyRecord;

use super::storage::LocalStore;

/// Bounded cache of currency metadata.
///
/// With no store every operation is a no-op and reads come back empty.
#[derive(Clone)]
pub struct CurrencyCache {
  store: Option<Arc<LocalStore>>,
}

impl CurrencyCache {
  pub fn new(store: Option<Arc<LocalStore>>) -> Self {
    Self { store }
  }

  /// Upsert `records` and trim the collection to its cap.
  pub async fn put(&self, records: Vec<CurrencyRecord>) {
    let Some(store) = &self.store else {
      return;
    };

    let count = records.len();
    match store.run(move |s| s.put_all(&records)).await {
      Ok(evicted) => debug!(count, evicted, "Currency list added to cache"),
      Err(e) => warn!("Failed to cache currency list: {}", e),
    }
  }

  /// Every cached currency, or nothing when the cache is unusable.
  pub async fn get_all(&self) -> Vec<CurrencyRecord> {
    let Some(store) = &self.store else {
      return Vec::new();
    };

    match store.run(|s| s.get_all::<CurrencyRecord>()).await {
      Ok(records) => {
        debug!(count = records.len(), "Fetched currencies from cache");
        records
      }
      Err(e) => {
        warn!("Failed to read cached currencies: {}", e);
        Vec::new()
      }
    }
  }

  /// Number of cached currencies.
  pub async fn len(&self) -> usize {
    let Some(store) = &self.store else {
      return 0;
    };

    store
      .run(|s| s.count::<CurrencyRecord>())
      .await
      .unwrap_or_else(|e| {
        warn!("Failed to count cached currencies: {}", e);
        0
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn currency(id: &str) -> CurrencyRecord {
    CurrencyRecord {
      id: id.to_string(),
      currency_name: id.to_lowercase(),
      currency_symbol: None,
    }
  }

  fn cache() -> (CurrencyCache, Arc<LocalStore>) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    (CurrencyCache::new(Some(Arc::clone(&store))), store)
  }

  #[tokio::test]
  async fn test_put_then_get_all() {
    let (cache, _) = cache();
    cache.put(vec![currency("USD"), currency("EUR")]).await;

    let ids: Vec<String> = cache.get_all().await.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["EUR", "USD"]);
  }

  #[tokio::test]
  async fn test_put_enforces_cap_of_160() {
    let (cache, store) = cache();
    let records: Vec<CurrencyRecord> = (0..200).map(|i| currency(&format!("X{:03}", i))).collect();

    cache.put(records).await;

    assert_eq!(cache.len().await, 160);
    let newest = store.keys_by_recency::<CurrencyRecord>().unwrap();
    assert_eq!(newest.first().map(String::as_str), Some("X199"));
    assert_eq!(newest.last().map(String::as_str), Some("X040"));
  }

  #[tokio::test]
  async fn test_refresh_keeps_recently_upserted() {
    let (cache, store) = cache();
    let first: Vec<CurrencyRecord> = (0..160).map(|i| currency(&format!("A{:03}", i))).collect();
    cache.put(first).await;

    // Re-listing an old id makes it recent again
    cache.put(vec![currency("A000"), currency("NEW")]).await;

    assert_eq!(cache.len().await, 160);
    assert!(store.get::<CurrencyRecord>("A000").unwrap().is_some());
    assert!(store.get::<CurrencyRecord>("NEW").unwrap().is_some());
    assert!(store.get::<CurrencyRecord>("A001").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_without_store_is_noop() {
    let cache = CurrencyCache::new(None);
    cache.put(vec![currency("USD")]).await;

    assert!(cache.get_all().await.is_empty());
    assert_eq!(cache.len().await, 0);
  }
}
