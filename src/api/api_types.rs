//! Serde-deserializable types matching the exchange-rate service responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::types::CurrencyRecord;

// ============================================================================
// Currency list endpoint response
// ============================================================================

/// `GET /currencies` body: `{"results": {"USD": {...}, ...}}`
#[derive(Debug, Deserialize)]
pub struct ApiCurrenciesResponse {
  /// Keyed by currency code, in the order the service sent them
  pub results: Map<String, Value>,
}

impl ApiCurrenciesResponse {
  /// Convert to domain records, keeping arrival order.
  ///
  /// Entries that don't look like a currency are skipped.
  pub fn into_records(self) -> Vec<CurrencyRecord> {
    self
      .results
      .into_iter()
      .filter_map(|(code, value)| match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
          warn!(%code, "Skipping malformed currency entry: {}", e);
          None
        }
      })
      .collect()
  }
}

// ============================================================================
// Conversion endpoint response
// ============================================================================

/// `GET /convert?q=FROM_TO&compact=ultra` body: `{"FROM_TO": 0.9}`
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ApiConvertResponse(pub Map<String, Value>);

impl ApiConvertResponse {
  /// Rate for `query`, or the lone value of a single-entry body whose key
  /// differs.
  pub fn rate_for(&self, query: &str) -> Option<f64> {
    if let Some(value) = self.0.get(query) {
      return value.as_f64();
    }

    match self.0.len() {
      1 => self.0.values().next().and_then(Value::as_f64),
      _ => None,
    }
  }
}
