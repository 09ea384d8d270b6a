//! Decoding of cached CoinMarketCap responses (`quotes/latest` and `map`).
//!
//! Responses are read from files written by an external fetcher; nothing
//! here talks to the network.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{CoreError, CurrencyListing, Platform, Quote, Symbol, UtcDateTime, ValidationError};

const QUOTE_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: Status,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_message: Option<String>,
}

impl Status {
    fn check(&self) -> Result<(), ValidationError> {
        if self.error_code == 0 {
            return Ok(());
        }
        Err(ValidationError::ProviderStatus {
            code: self.error_code,
            message: self
                .error_message
                .clone()
                .unwrap_or_else(|| String::from("no message")),
        })
    }
}

/// `data` maps ids (or symbols) to one object, or a list when a symbol is ambiguous.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct RawCurrencyQuote {
    id: i64,
    name: String,
    symbol: String,
    last_updated: Option<String>,
    #[serde(default)]
    quote: BTreeMap<String, RawUsdQuote>,
}

#[derive(Debug, Deserialize)]
struct RawUsdQuote {
    price: Option<f64>,
    volume_24h: Option<f64>,
    volume_change_24h: Option<f64>,
    percent_change_1h: Option<f64>,
    percent_change_24h: Option<f64>,
    percent_change_7d: Option<f64>,
    percent_change_30d: Option<f64>,
    percent_change_60d: Option<f64>,
    percent_change_90d: Option<f64>,
    market_cap: Option<f64>,
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    id: i64,
    rank: Option<i64>,
    name: String,
    symbol: String,
    slug: String,
    #[serde(default)]
    is_active: Option<i64>,
    first_historical_data: Option<String>,
    last_historical_data: Option<String>,
    platform: Option<RawPlatform>,
}

#[derive(Debug, Deserialize)]
struct RawPlatform {
    id: i64,
    name: String,
    symbol: String,
    slug: String,
}

/// Decode a `quotes/latest` file into quotes.
///
/// Entries without a USD price are skipped. When `tracked` is non-empty only
/// those symbols are kept.
pub fn read_quotes_file(path: &Path, tracked: &[Symbol]) -> Result<Vec<Quote>, CoreError> {
    let content = fs::read_to_string(path).map_err(|error| CoreError::io(path, error))?;
    decode_quotes(&content, tracked)
}

pub fn decode_quotes(content: &str, tracked: &[Symbol]) -> Result<Vec<Quote>, CoreError> {
    let envelope: Envelope<BTreeMap<String, OneOrMany<RawCurrencyQuote>>> =
        serde_json::from_str(content)?;
    envelope.status.check()?;

    let mut quotes = Vec::new();
    for entry in envelope.data.unwrap_or_default().into_values() {
        let entries = match entry {
            OneOrMany::One(raw) => vec![raw],
            OneOrMany::Many(raws) => raws,
        };
        for raw in entries {
            if let Some(quote) = convert_quote(raw, tracked)? {
                quotes.push(quote);
            }
        }
    }

    tracing::debug!(count = quotes.len(), "decoded provider quotes");
    Ok(quotes)
}

fn convert_quote(raw: RawCurrencyQuote, tracked: &[Symbol]) -> Result<Option<Quote>, CoreError> {
    let wanted = tracked.is_empty()
        || tracked
            .iter()
            .any(|symbol| symbol.as_str().eq_ignore_ascii_case(raw.symbol.trim()));
    if !wanted {
        return Ok(None);
    }
    let symbol = Symbol::parse(&raw.symbol)?;

    let Some(usd) = raw.quote.get(QUOTE_CURRENCY) else {
        tracing::warn!(symbol = %symbol, "quote entry has no USD conversion, skipping");
        return Ok(None);
    };
    let Some(price) = usd.price else {
        tracing::warn!(symbol = %symbol, "quote entry has no price, skipping");
        return Ok(None);
    };

    let last_updated = match usd.last_updated.as_deref().or(raw.last_updated.as_deref()) {
        Some(value) => UtcDateTime::parse(value)?,
        None => UtcDateTime::now(),
    };

    let quote = Quote {
        cmc_id: raw.id,
        symbol,
        name: raw.name,
        price,
        volume_24h: usd.volume_24h,
        volume_change_24h: usd.volume_change_24h,
        percent_change_1h: usd.percent_change_1h,
        percent_change_24h: usd.percent_change_24h,
        percent_change_7d: usd.percent_change_7d,
        percent_change_30d: usd.percent_change_30d,
        percent_change_60d: usd.percent_change_60d,
        percent_change_90d: usd.percent_change_90d,
        market_cap: usd.market_cap,
        last_updated,
    };
    quote.validate()?;
    Ok(Some(quote))
}

/// Decode a cached `cryptocurrency/map` file into id map listings.
pub fn read_map_file(path: &Path) -> Result<Vec<CurrencyListing>, CoreError> {
    let content = fs::read_to_string(path).map_err(|error| CoreError::io(path, error))?;
    decode_map(&content)
}

pub fn decode_map(content: &str) -> Result<Vec<CurrencyListing>, CoreError> {
    let envelope: Envelope<Vec<RawListing>> = serde_json::from_str(content)?;
    envelope.status.check()?;

    let listings = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|raw| CurrencyListing {
            id: raw.id,
            rank: raw.rank,
            name: raw.name,
            symbol: raw.symbol,
            slug: raw.slug,
            is_active: raw.is_active.unwrap_or(1) != 0,
            first_historical_data: raw.first_historical_data,
            last_historical_data: raw.last_historical_data,
            platform: raw.platform.map(|platform| Platform {
                id: platform.id,
                name: platform.name,
                symbol: platform.symbol,
                slug: platform.slug,
            }),
        })
        .collect::<Vec<_>>();

    tracing::debug!(count = listings.len(), "decoded provider id map");
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTES: &str = r#"{
      "status": {"error_code": 0, "error_message": null},
      "data": {
        "1": {
          "id": 1, "name": "Bitcoin", "symbol": "BTC",
          "last_updated": "2025-12-17T10:00:00.000Z",
          "quote": {"USD": {"price": 95000.5, "volume_24h": 1.5e10,
            "percent_change_24h": -1.25, "market_cap": 1.8e12,
            "last_updated": "2025-12-17T10:00:00.000Z"}}
        },
        "XMR": [{
          "id": 328, "name": "Monero", "symbol": "XMR",
          "quote": {"USD": {"price": 410.0, "last_updated": "2025-12-17T10:01:00Z"}}
        }],
        "DOGE": {
          "id": 74, "name": "Dogecoin", "symbol": "DOGE",
          "quote": {"USD": {"price": 0.3, "last_updated": "2025-12-17T10:01:00Z"}}
        }
      }
    }"#;

    #[test]
    fn decodes_single_and_list_entries() {
        let quotes = decode_quotes(QUOTES, &[]).expect("decode");
        assert_eq!(quotes.len(), 3);
        let btc = quotes
            .iter()
            .find(|quote| quote.symbol.as_str() == "BTC")
            .expect("btc");
        assert_eq!(btc.price, 95000.5);
        assert_eq!(btc.percent_change_24h, Some(-1.25));
    }

    #[test]
    fn tracked_symbols_filter_entries() {
        let tracked = vec![Symbol::parse("XMR").expect("symbol")];
        let quotes = decode_quotes(QUOTES, &tracked).expect("decode");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].name, "Monero");
    }

    #[test]
    fn provider_error_status_is_surfaced() {
        let error = decode_quotes(
            r#"{"status": {"error_code": 1001, "error_message": "API key invalid"}, "data": null}"#,
            &[],
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("API key invalid"));
    }

    #[test]
    fn decodes_id_map() {
        let listings = decode_map(
            r#"{"status": {"error_code": 0}, "data": [
                {"id": 328, "rank": 30, "name": "Monero", "symbol": "XMR", "slug": "monero",
                 "is_active": 1, "first_historical_data": "2014-05-21T23:04:01.000Z",
                 "last_historical_data": "2025-12-17T09:00:00.000Z", "platform": null},
                {"id": 825, "rank": 3, "name": "Tether USDt", "symbol": "USDT", "slug": "tether",
                 "is_active": 1, "platform": {"id": 1027, "name": "Ethereum", "symbol": "ETH", "slug": "ethereum"}}
            ]}"#,
        )
        .expect("decode");
        assert_eq!(listings.len(), 2);
        assert!(listings[0].platform.is_none());
        assert_eq!(
            listings[1].platform.as_ref().map(|platform| platform.slug.as_str()),
            Some("ethereum")
        );
    }
}
