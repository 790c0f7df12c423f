use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiConvertResponse, ApiCurrenciesResponse};
use super::error::ApiError;
use super::types::{CurrencyRecord, PairKey};

/// Remote exchange-rate service
#[async_trait]
pub trait ExchangeService: Send + Sync {
  /// Every currency the service knows about, in the order it lists them
  async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>, ApiError>;

  /// Current rate for converting `from` into `to`
  async fn conversion_rate(&self, from: &str, to: &str) -> Result<f64, ApiError>;
}

/// HTTP client for the currency converter API
#[derive(Clone)]
pub struct ExchangeClient {
  client: reqwest::Client,
  base_url: Url,
}

impl ExchangeClient {
  pub fn new(config: &Config) -> Result<Self, ApiError> {
    let base_url = Url::parse(&config.api.base_url)?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::InvalidUrl(
        url::ParseError::RelativeUrlWithCannotBeABaseBase,
      ));
    }

    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { client, base_url })
  }

  /// Build `{base}/{segment}`, keeping any path already in the base URL.
  fn endpoint(&self, segment: &str) -> Url {
    let mut url = self.base_url.clone();
    // cannot_be_a_base was rejected in new()
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(segment);
    }
    url
  }

  /// URL for the conversion query; currency codes are form-encoded.
  pub fn convert_url(&self, from: &str, to: &str) -> Url {
    let mut url = self.endpoint("convert");
    url
      .query_pairs_mut()
      .append_pair("q", &PairKey::new(from, to).to_string())
      .append_pair("compact", "ultra");
    url
  }

  pub fn currencies_url(&self) -> Url {
    self.endpoint("currencies")
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ApiError::from_status(status, &body));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
  }
}

#[async_trait]
impl ExchangeService for ExchangeClient {
  async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>, ApiError> {
    let response: ApiCurrenciesResponse = self.get_json(self.currencies_url()).await?;
    Ok(response.into_records())
  }

  async fn conversion_rate(&self, from: &str, to: &str) -> Result<f64, ApiError> {
    let query = PairKey::new(from, to).to_string();
    let response: ApiConvertResponse = self.get_json(self.convert_url(from, to)).await?;

    response
      .rate_for(&query)
      .ok_or(ApiError::MissingRate(query))
  }
}
