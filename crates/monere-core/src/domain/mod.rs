//! # Domain Models
//!
//! Canonical market-data types shared by ingestion, storage, and alerting.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Latest USD quote for one currency |
//! | [`CurrencyListing`] | Provider id map entry |
//! | [`HistoryBar`] | Daily OHLCV period from a historical export |
//! | [`Symbol`] | Validated, uppercase ticker |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod symbol;
mod timestamp;

pub use models::{parse_date, CurrencyListing, HistoryBar, Platform, Quote};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
