//! Local cache for offline support.
//!
//! This module provides:
//! - A SQLite-backed store with one table per collection and additive migrations
//! - Bounded collections that evict the oldest records beyond their cap
//! - Managers for the currency list and conversion rates that log and swallow
//!   storage failures, so a broken cache only ever looks like an empty one

mod currencies;
mod error;
mod rates;
mod schema;
mod storage;
mod traits;

pub use currencies::CurrencyCache;
pub use rates::RateCache;
pub use storage::LocalStore;
pub use traits::{Collection, StoredRecord, CURRENCIES, CURRENCY_RATES};
