//! In-process exchange service for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::api_types::ApiCurrenciesResponse;
use super::client::ExchangeService;
use super::error::ApiError;
use super::types::{CurrencyRecord, PairKey};

pub struct FakeExchange {
  online: bool,
  currencies: Vec<CurrencyRecord>,
  currencies_body: Option<String>,
  rates: HashMap<String, f64>,
  rate_calls: AtomicUsize,
}

impl FakeExchange {
  pub fn online() -> Self {
    Self {
      online: true,
      currencies: Vec::new(),
      currencies_body: None,
      rates: HashMap::new(),
      rate_calls: AtomicUsize::new(0),
    }
  }

  pub fn offline() -> Self {
    Self {
      online: false,
      ..Self::online()
    }
  }

  pub fn with_currencies(mut self, ids: &[&str]) -> Self {
    self.currencies = ids
      .iter()
      .map(|id| CurrencyRecord {
        id: id.to_string(),
        currency_name: format!("{} currency", id),
        currency_symbol: None,
      })
      .collect();
    self
  }

  /// Answer the currency list with a raw JSON body, decoded like the HTTP client does.
  pub fn with_currencies_body(mut self, body: &str) -> Self {
    self.currencies_body = Some(body.to_string());
    self
  }

  pub fn with_rate(mut self, query: &str, rate: f64) -> Self {
    self.rates.insert(query.to_string(), rate);
    self
  }

  pub fn rate_calls(&self) -> usize {
    self.rate_calls.load(Ordering::SeqCst)
  }

  fn unreachable() -> ApiError {
    ApiError::ServerError("connection refused".to_string())
  }
}

#[async_trait]
impl ExchangeService for FakeExchange {
  async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>, ApiError> {
    if !self.online {
      return Err(Self::unreachable());
    }
    if let Some(body) = &self.currencies_body {
      let response: ApiCurrenciesResponse =
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
      return Ok(response.into_records());
    }
    Ok(self.currencies.clone())
  }

  async fn conversion_rate(&self, from: &str, to: &str) -> Result<f64, ApiError> {
    self.rate_calls.fetch_add(1, Ordering::SeqCst);
    if !self.online {
      return Err(Self::unreachable());
    }
    let query = PairKey::new(from, to).to_string();
    self
      .rates
      .get(&query)
      .copied()
      .ok_or(ApiError::MissingRate(query))
  }
}
