use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cache::{Collection, StoredRecord, CURRENCIES, CURRENCY_RATES};

/// Currency metadata as listed by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRecord {
  pub id: String,
  pub currency_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency_symbol: Option<String>,
}

impl CurrencyRecord {
  /// Label shown for this currency in a selection list
  pub fn label(&self) -> String {
    match &self.currency_symbol {
      Some(symbol) => format!("{} ({})", self.currency_name, symbol),
      None => format!("{} ({})", self.currency_name, self.id),
    }
  }
}

/// Cached rate for a directional currency pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
  pub query: String,
  pub rate: f64,
}

impl StoredRecord for CurrencyRecord {
  fn collection() -> Collection {
    CURRENCIES
  }

  fn record_key(&self) -> String {
    self.id.clone()
  }
}

impl StoredRecord for RateRecord {
  fn collection() -> Collection {
    CURRENCY_RATES
  }

  fn record_key(&self) -> String {
    self.query.clone()
  }
}

/// Directional pair key, rendered as `FROM_TO`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
  pub from: String,
  pub to: String,
}

impl PairKey {
  pub fn new(from: &str, to: &str) -> Self {
    Self {
      from: from.to_string(),
      to: to.to_string(),
    }
  }
}

impl fmt::Display for PairKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.from, self.to)
  }
}

/// Where a rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  /// Fetched from the remote service
  Online,
  /// Served from the local cache after a network failure
  Offline,
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Status::Online => write!(f, "online"),
      Status::Offline => write!(f, "offline"),
    }
  }
}

/// A rate together with its source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
  pub rate: f64,
  pub source: Status,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_label_with_symbol() {
    let usd = CurrencyRecord {
      id: "USD".into(),
      currency_name: "United States Dollar".into(),
      currency_symbol: Some("$".into()),
    };
    assert_eq!(usd.label(), "United States Dollar ($)");
  }

  #[test]
  fn test_label_without_symbol() {
    let xau = CurrencyRecord {
      id: "XAU".into(),
      currency_name: "Gold".into(),
      currency_symbol: None,
    };
    assert_eq!(xau.label(), "Gold (XAU)");
  }

  #[test]
  fn test_pair_key_is_directional() {
    assert_eq!(PairKey::new("USD", "EUR").to_string(), "USD_EUR");
    assert_ne!(PairKey::new("USD", "EUR"), PairKey::new("EUR", "USD"));
  }

  #[test]
  fn test_currency_record_wire_names() {
    let json = r#"{"id":"EUR","currencyName":"Euro","currencySymbol":"€"}"#;
    let record: CurrencyRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.currency_name, "Euro");
    assert_eq!(record.currency_symbol.as_deref(), Some("€"));
  }
}
