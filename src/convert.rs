//! Conversion requests: input validation, rate lookup, and caching of fresh rates.

use thiserror::Error;
use tracing::info;

use crate::api::{CurrencyListing, ExchangeService, FetchLayer, RateUnavailable, Status};
use crate::render::{Render, MSG_IN_PROGRESS, MSG_OFFLINE_NO_RATE};

/// Rejected user input. The message is what the user sees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
  #[error("Amount must be a number greater than 0.")]
  InvalidAmount,

  #[error("Please specify the currency to convert from.")]
  MissingFrom,

  #[error("Please specify the currency to convert to.")]
  MissingTo,

  #[error("Please choose a different currency to convert to.")]
  SameCurrency,
}

#[derive(Error, Debug)]
pub enum ConvertError {
  #[error(transparent)]
  Invalid(#[from] ValidationError),

  #[error(transparent)]
  Unavailable(#[from] RateUnavailable),
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRequest {
  pub amount: f64,
  pub from: String,
  pub to: String,
}

/// Check raw form input, stopping at the first problem.
pub fn validate(amount: &str, from: &str, to: &str) -> Result<ValidRequest, ValidationError> {
  let amount = amount
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|a| a.is_finite() && *a > 0.0)
    .ok_or(ValidationError::InvalidAmount)?;

  let from = from.trim();
  if from.is_empty() {
    return Err(ValidationError::MissingFrom);
  }

  let to = to.trim();
  if to.is_empty() {
    return Err(ValidationError::MissingTo);
  }

  if from == to {
    return Err(ValidationError::SameCurrency);
  }

  Ok(ValidRequest {
    amount,
    from: from.to_string(),
    to: to.to_string(),
  })
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
  pub amount: f64,
  pub from: String,
  pub to: String,
  pub rate: f64,
  pub result: f64,
  pub source: Status,
}

impl Conversion {
  pub fn status_message(&self) -> String {
    format!("Conversion rate : {} ({})", self.rate, self.source)
  }
}

/// Converter service, built once at startup and handed to command handlers.
pub struct Converter<S: ExchangeService> {
  fetch: FetchLayer<S>,
}

impl<S: ExchangeService> Converter<S> {
  pub fn new(fetch: FetchLayer<S>) -> Self {
    Self { fetch }
  }

  pub fn fetch_layer(&self) -> &FetchLayer<S> {
    &self.fetch
  }

  /// Load and render the currency list.
  pub async fn load_currencies(&self, render: &dyn Render) -> CurrencyListing {
    self.fetch.fetch_currency_list(render).await
  }

  /// Validate the input, look up the rate and render the result.
  ///
  /// Invalid input never reaches the network or the cache. Only rates fetched
  /// online are written back to the rate cache. Every failure is rendered as
  /// a status message before it is returned.
  pub async fn convert(
    &self,
    amount: &str,
    from: &str,
    to: &str,
    render: &dyn Render,
  ) -> Result<Conversion, ConvertError> {
    let request = match validate(amount, from, to) {
      Ok(r) => r,
      Err(e) => {
        render.render_status_message(&e.to_string());
        return Err(e.into());
      }
    };

    render.render_status_message(MSG_IN_PROGRESS);

    let quote = match self
      .fetch
      .fetch_rate(request.amount, &request.from, &request.to)
      .await
    {
      Ok(q) => q,
      Err(e) => {
        render.render_status_message(MSG_OFFLINE_NO_RATE);
        return Err(e.into());
      }
    };

    let conversion = Conversion {
      amount: request.amount,
      result: request.amount * quote.rate,
      rate: quote.rate,
      source: quote.source,
      from: request.from,
      to: request.to,
    };

    render.render_result(conversion.result);
    render.render_status_message(&conversion.status_message());
    info!(
      from = %conversion.from,
      to = %conversion.to,
      rate = conversion.rate,
      source = %conversion.source,
      "Converted"
    );

    if conversion.source == Status::Online {
      self
        .fetch
        .rates()
        .put(conversion.rate, &conversion.from, &conversion.to)
        .await;
    }

    Ok(conversion)
  }
}
