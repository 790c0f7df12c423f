//! Network-first fetching with fallback to the local cache.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CurrencyCache, RateCache};
use crate::render::{Render, MSG_OFFLINE, MSG_ONLINE};

use super::client::ExchangeService;
use super::error::ApiError;
use super::types::{CurrencyRecord, PairKey, RateQuote, Status};

/// Both the network and the rate cache came up empty.
#[derive(Error, Debug)]
#[error("Network failed ({network}) and no cached rate for {query}")]
pub struct RateUnavailable {
  pub query: String,
  #[source]
  pub network: ApiError,
}

/// Currencies that were rendered, and where they came from.
#[derive(Debug, Clone)]
pub struct CurrencyListing {
  pub currencies: Vec<CurrencyRecord>,
  pub source: Status,
}

/// Fetch layer that prefers the network and falls back to cached data.
///
/// This sits between the converter and the exchange service. Successful
/// currency listings refresh the cache; rates are cached by the caller, which
/// knows whether the rate was freshly fetched.
pub struct FetchLayer<S: ExchangeService> {
  service: S,
  currencies: CurrencyCache,
  rates: RateCache,
}

impl<S: ExchangeService> FetchLayer<S> {
  pub fn new(service: S, currencies: CurrencyCache, rates: RateCache) -> Self {
    Self {
      service,
      currencies,
      rates,
    }
  }

  pub fn rates(&self) -> &RateCache {
    &self.rates
  }

  pub fn currencies(&self) -> &CurrencyCache {
    &self.currencies
  }

  #[cfg(test)]
  pub fn service(&self) -> &S {
    &self.service
  }

  /// Fetch the currency list and render it.
  ///
  /// 1. Ask the service; on success render every record in arrival order
  /// 2. Only then write the records to the cache
  /// 3. On any failure render whatever the cache holds (possibly nothing)
  pub async fn fetch_currency_list(&self, render: &dyn Render) -> CurrencyListing {
    match self.service.list_currencies().await {
      Ok(currencies) => {
        info!(count = currencies.len(), "Fetched currency list");
        for currency in &currencies {
          render.render_currency_option(&currency.id, &currency.label());
        }
        render.render_status_message(MSG_ONLINE);

        self.currencies.put(currencies.clone()).await;

        CurrencyListing {
          currencies,
          source: Status::Online,
        }
      }
      Err(e) => {
        warn!("Currency list unavailable, using cache: {}", e);
        let currencies = self.currencies.get_all().await;
        for currency in &currencies {
          render.render_currency_option(&currency.id, &currency.label());
        }
        render.render_status_message(MSG_OFFLINE);

        CurrencyListing {
          currencies,
          source: Status::Offline,
        }
      }
    }
  }

  /// Fetch the rate for a directional pair.
  ///
  /// Network rates come back as [`Status::Online`]; on network failure the
  /// exact pair is looked up in the rate cache and tagged
  /// [`Status::Offline`]. Nothing is written to the cache here.
  pub async fn fetch_rate(
    &self,
    amount: f64,
    from: &str,
    to: &str,
  ) -> Result<RateQuote, RateUnavailable> {
    debug!(amount, from, to, "Fetching conversion rate");

    match self.service.conversion_rate(from, to).await {
      Ok(rate) => Ok(RateQuote {
        rate,
        source: Status::Online,
      }),
      Err(network) => {
        warn!(from, to, "Rate request failed, trying cache: {}", network);
        match self.rates.get(from, to).await {
          Ok(rate) => Ok(RateQuote {
            rate,
            source: Status::Offline,
          }),
          Err(_) => Err(RateUnavailable {
            query: PairKey::new(from, to).to_string(),
            network,
          }),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fake::FakeExchange;
  use crate::cache::LocalStore;
  use crate::render::RecordingRenderer;
  use std::sync::Arc;

  fn layer(service: FakeExchange) -> (FetchLayer<FakeExchange>, Arc<LocalStore>) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let layer = FetchLayer::new(
      service,
      CurrencyCache::new(Some(Arc::clone(&store))),
      RateCache::new(Some(Arc::clone(&store))),
    );
    (layer, store)
  }

  #[tokio::test]
  async fn test_currency_list_online_renders_then_caches() {
    let (layer, _) = layer(FakeExchange::online().with_currencies(&["USD", "EUR", "AUD"]));
    let render = RecordingRenderer::default();

    let listing = layer.fetch_currency_list(&render).await;

    assert_eq!(listing.source, Status::Online);
    assert_eq!(render.options(), vec!["USD", "EUR", "AUD"]);
    assert_eq!(render.statuses(), vec![MSG_ONLINE]);
    assert_eq!(layer.currencies().len().await, 3);
  }

  #[tokio::test]
  async fn test_currency_list_offline_uses_cache() {
    let (layer, _) = layer(FakeExchange::offline());
    layer
      .currencies()
      .put(vec![CurrencyRecord {
        id: "GBP".into(),
        currency_name: "British Pound".into(),
        currency_symbol: Some("£".into()),
      }])
      .await;
    let render = RecordingRenderer::default();

    let listing = layer.fetch_currency_list(&render).await;

    assert_eq!(listing.source, Status::Offline);
    assert_eq!(render.options(), vec!["GBP"]);
    assert_eq!(render.statuses(), vec![MSG_OFFLINE]);
  }

  #[tokio::test]
  async fn test_currency_list_without_results_uses_cache() {
    let (layer, _) =
      layer(FakeExchange::online().with_currencies_body(r#"{"error": "quota exceeded"}"#));
    layer
      .currencies()
      .put(vec![CurrencyRecord {
        id: "JPY".into(),
        currency_name: "Japanese Yen".into(),
        currency_symbol: None,
      }])
      .await;
    let render = RecordingRenderer::default();

    let listing = layer.fetch_currency_list(&render).await;

    assert_eq!(listing.source, Status::Offline);
    assert_eq!(render.options(), vec!["JPY"]);
    assert_eq!(render.statuses(), vec![MSG_OFFLINE]);
  }

  #[tokio::test]
  async fn test_currency_list_offline_empty_cache() {
    let (layer, _) = layer(FakeExchange::offline());
    let render = RecordingRenderer::default();

    let listing = layer.fetch_currency_list(&render).await;

    assert!(listing.currencies.is_empty());
    assert!(render.options().is_empty());
    assert_eq!(render.statuses(), vec![MSG_OFFLINE]);
  }

  #[tokio::test]
  async fn test_fetch_rate_online_not_cached_here() {
    let (layer, _) = layer(FakeExchange::online().with_rate("USD_EUR", 0.9));

    let quote = layer.fetch_rate(10.0, "USD", "EUR").await.unwrap();

    assert_eq!(quote.rate, 0.9);
    assert_eq!(quote.source, Status::Online);
    assert_eq!(layer.rates().len().await, 0);
  }

  #[tokio::test]
  async fn test_fetch_rate_offline_cache_hit() {
    let (layer, _) = layer(FakeExchange::offline());
    layer.rates().put(0.85, "USD", "EUR").await;

    let quote = layer.fetch_rate(10.0, "USD", "EUR").await.unwrap();

    assert_eq!(quote.rate, 0.85);
    assert_eq!(quote.source, Status::Offline);
  }

  #[tokio::test]
  async fn test_fetch_rate_offline_cache_miss() {
    let (layer, _) = layer(FakeExchange::offline());
    layer.rates().put(0.85, "USD", "EUR").await;

    let err = layer.fetch_rate(10.0, "EUR", "USD").await.unwrap_err();

    assert_eq!(err.query, "EUR_USD");
  }

  #[tokio::test]
  async fn test_fetch_rate_without_store() {
    let layer = FetchLayer::new(
      FakeExchange::offline(),
      CurrencyCache::new(None),
      RateCache::new(None),
    );

    assert!(layer.fetch_rate(1.0, "USD", "EUR").await.is_err());
  }
}
