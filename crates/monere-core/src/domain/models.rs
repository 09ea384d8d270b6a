use serde::{Deserialize, Serialize};
use time::format_description;
use time::Date;

use crate::{Symbol, UtcDateTime, ValidationError};

/// Latest market observation for one cryptocurrency, quoted in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub cmc_id: i64,
    pub symbol: Symbol,
    pub name: String,
    pub price: f64,
    pub volume_24h: Option<f64>,
    pub volume_change_24h: Option<f64>,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub percent_change_30d: Option<f64>,
    pub percent_change_60d: Option<f64>,
    pub percent_change_90d: Option<f64>,
    pub market_cap: Option<f64>,
    pub last_updated: UtcDateTime,
}

impl Quote {
    /// Check the numeric invariants of a decoded quote.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("price", self.price)?;
        validate_optional_non_negative("volume_24h", self.volume_24h)?;
        validate_optional_non_negative("market_cap", self.market_cap)?;
        for (field, value) in [
            ("volume_change_24h", self.volume_change_24h),
            ("percent_change_1h", self.percent_change_1h),
            ("percent_change_24h", self.percent_change_24h),
            ("percent_change_7d", self.percent_change_7d),
            ("percent_change_30d", self.percent_change_30d),
            ("percent_change_60d", self.percent_change_60d),
            ("percent_change_90d", self.percent_change_90d),
        ] {
            if value.is_some_and(|value| !value.is_finite()) {
                return Err(ValidationError::NonFiniteValue { field });
            }
        }
        Ok(())
    }
}

/// Token platform for currencies issued on another chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub slug: String,
}

/// One entry of the provider's id map, used to resolve symbols to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyListing {
    pub id: i64,
    pub rank: Option<i64>,
    pub name: String,
    pub symbol: String,
    pub slug: String,
    pub is_active: bool,
    pub first_historical_data: Option<String>,
    pub last_historical_data: Option<String>,
    pub platform: Option<Platform>,
}

/// Daily OHLCV period from a historical export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    pub symbol: Symbol,
    pub start_date: Date,
    pub end_date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
}

impl HistoryBar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        start_date: Date,
        end_date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
        market_cap: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_optional_non_negative("volume", volume)?;
        validate_optional_non_negative("market_cap", market_cap)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            symbol,
            start_date,
            end_date,
            open,
            high,
            low,
            close,
            volume,
            market_cap,
        })
    }
}

/// Parse the leading `YYYY-MM-DD` of a date or date-time string.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let trimmed = input.trim().trim_matches('"');
    let head = trimmed.get(..10).unwrap_or(trimmed);
    let invalid = || ValidationError::InvalidDate {
        value: input.to_owned(),
    };
    let format = format_description::parse("[year]-[month]-[day]").map_err(|_| invalid())?;
    Date::parse(head, &format).map_err(|_| invalid())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_non_negative(field, value),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_prefix_of_datetime() {
        let date = parse_date("2025-12-17T00:00:00Z").expect("date");
        assert_eq!(date.to_string(), "2025-12-17");
    }

    #[test]
    fn rejects_non_date() {
        let err = parse_date("17/12/2025").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn history_bar_rejects_inverted_range() {
        let day = parse_date("2025-12-17").expect("date");
        let err = HistoryBar::new(
            Symbol::parse("XMR").expect("symbol"),
            day,
            day,
            100.0,
            90.0,
            110.0,
            100.0,
            None,
            None,
        )
        .expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidBarRange);
    }
}
