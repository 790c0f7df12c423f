//! Core traits and types for the record cache.

use serde::{de::DeserializeOwned, Serialize};

/// A named collection in the local store.
///
/// Each collection is a table keyed by `key_column`, with a unique index on
/// the same column and a cap on the number of rows kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
  /// Table name (e.g. "currencies")
  pub name: &'static str,
  /// Column holding the record key, also the unique secondary index
  pub key_column: &'static str,
  /// Maximum number of records kept after a put
  pub cap: usize,
}

/// Currency metadata, keyed by currency id.
pub const CURRENCIES: Collection = Collection {
  name: "currencies",
  key_column: "id",
  cap: 160,
};

/// Conversion rates, keyed by pair key.
pub const CURRENCY_RATES: Collection = Collection {
  name: "currencyRates",
  key_column: "query",
  cap: 50,
};

/// Trait for records that live in a store collection.
pub trait StoredRecord: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Collection this record type is stored in
  fn collection() -> Collection;

  /// Unique key of this record within its collection
  fn record_key(&self) -> String;
}
