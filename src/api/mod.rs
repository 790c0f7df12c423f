//! Exchange-rate service access.
//!
//! `client` talks HTTP, `fetch` layers the network-first / cache-fallback
//! policy on top of any [`ExchangeService`].

pub mod api_types;
pub mod client;
pub mod error;
pub mod fetch;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use client::{ExchangeClient, ExchangeService};
pub use fetch::{CurrencyListing, FetchLayer, RateUnavailable};
pub use types::Status;
