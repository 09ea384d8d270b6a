use std::fmt::{Display, Formatter};

use crate::{Symbol, ValidationError};

use super::duration::parse_duration_days;

/// Which currencies a variability rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CurrencyFilter {
    Exact(Symbol),
    All,
}

impl CurrencyFilter {
    /// Build a filter from an optional rule field; absent or blank means all.
    pub fn from_optional(currency: Option<&str>) -> Result<Self, ValidationError> {
        match currency.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(raw) => Symbol::parse(raw).map(Self::Exact),
        }
    }

    pub fn matches(&self, symbol: &Symbol) -> bool {
        match self {
            Self::Exact(expected) => expected == symbol,
            Self::All => true,
        }
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Exact(symbol) => Some(symbol),
            Self::All => None,
        }
    }
}

impl Display for CurrencyFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(symbol) => f.write_str(symbol.as_str()),
            Self::All => f.write_str("*"),
        }
    }
}

/// Fires when the latest price of `currency` leaves `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRule {
    currency: Symbol,
    low: f64,
    high: f64,
}

impl RangeRule {
    pub fn new(currency: Symbol, low: f64, high: f64) -> Result<Self, ValidationError> {
        if !low.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "low" });
        }
        if !high.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "high" });
        }
        if low > high {
            return Err(ValidationError::InvertedRange {
                currency: currency.to_string(),
                low,
                high,
            });
        }
        Ok(Self {
            currency,
            low,
            high,
        })
    }

    pub fn currency(&self) -> &Symbol {
        &self.currency
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Bounds are inclusive: only prices strictly outside violate.
    pub fn is_violated_by(&self, price: f64) -> bool {
        price < self.low || price > self.high
    }
}

/// Fires when a currency's price moved at least `percent_change` percent
/// over the trailing `duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariabilityRule {
    currency: CurrencyFilter,
    percent_change: f64,
    duration_raw: String,
    duration_days: f64,
}

impl VariabilityRule {
    pub fn new(
        currency: CurrencyFilter,
        percent_change: f64,
        duration: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !percent_change.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "percent_change",
            });
        }
        let duration_raw = duration.into();
        let duration_days = parse_duration_days(&duration_raw)?;
        Ok(Self {
            currency,
            percent_change,
            duration_raw,
            duration_days,
        })
    }

    pub fn currency(&self) -> &CurrencyFilter {
        &self.currency
    }

    pub fn percent_change(&self) -> f64 {
        self.percent_change
    }

    pub fn duration_raw(&self) -> &str {
        &self.duration_raw
    }

    pub fn duration_days(&self) -> f64 {
        self.duration_days
    }

    /// The normalized form that is persisted and evaluated.
    pub fn criteria(&self) -> VariabilityCriteria {
        VariabilityCriteria {
            currency: self.currency.clone(),
            percent_change: self.percent_change,
            duration_days: self.duration_days,
        }
    }
}

/// A variability rule as stored: the raw duration text is gone, only days remain.
#[derive(Debug, Clone, PartialEq)]
pub struct VariabilityCriteria {
    pub currency: CurrencyFilter,
    pub percent_change: f64,
    pub duration_days: f64,
}

impl VariabilityCriteria {
    /// A non-negative threshold matches moves in either direction; a negative
    /// one only matches drops at least that deep.
    pub fn fires(&self, observed_percent: f64) -> bool {
        if self.percent_change < 0.0 {
            observed_percent <= self.percent_change
        } else {
            observed_percent.abs() >= self.percent_change
        }
    }
}

/// Rules loaded for one alert check. Never mutated after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    range_rules: Vec<RangeRule>,
    variability_rules: Vec<VariabilityRule>,
}

impl RuleSet {
    pub fn new(range_rules: Vec<RangeRule>, variability_rules: Vec<VariabilityRule>) -> Self {
        Self {
            range_rules,
            variability_rules,
        }
    }

    pub fn range_rules(&self) -> &[RangeRule] {
        &self.range_rules
    }

    pub fn variability_rules(&self) -> &[VariabilityRule] {
        &self.variability_rules
    }

    pub fn is_empty(&self) -> bool {
        self.range_rules.is_empty() && self.variability_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("symbol")
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let rule = RangeRule::new(symbol("BTC"), 90_000.0, 94_000.0).expect("rule");
        assert!(!rule.is_violated_by(90_000.0));
        assert!(!rule.is_violated_by(94_000.0));
        assert!(rule.is_violated_by(95_000.0));
        assert!(rule.is_violated_by(89_999.99));
    }

    #[test]
    fn range_rejects_low_above_high() {
        let err = RangeRule::new(symbol("BTC"), 100.0, 50.0).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedRange { .. }));
    }

    #[test]
    fn blank_currency_is_wildcard() {
        assert_eq!(CurrencyFilter::from_optional(None), Ok(CurrencyFilter::All));
        assert_eq!(CurrencyFilter::from_optional(Some(" ")), Ok(CurrencyFilter::All));
        assert_eq!(
            CurrencyFilter::from_optional(Some("xmr")),
            Ok(CurrencyFilter::Exact(symbol("XMR")))
        );
    }

    #[test]
    fn variability_rule_derives_days() {
        let rule = VariabilityRule::new(CurrencyFilter::All, 25.0, "2weeks").expect("rule");
        assert_eq!(rule.duration_days(), 14.0);
        assert_eq!(rule.duration_raw(), "2weeks");
    }

    #[test]
    fn positive_threshold_matches_both_directions() {
        let criteria = VariabilityCriteria {
            currency: CurrencyFilter::All,
            percent_change: 25.0,
            duration_days: 30.0,
        };
        assert!(criteria.fires(30.0));
        assert!(criteria.fires(-25.0));
        assert!(!criteria.fires(24.9));
    }

    #[test]
    fn negative_threshold_matches_drops_only() {
        let criteria = VariabilityCriteria {
            currency: CurrencyFilter::All,
            percent_change: -10.0,
            duration_days: 7.0,
        };
        assert!(criteria.fires(-12.0));
        assert!(!criteria.fires(12.0));
        assert!(!criteria.fires(-9.0));
    }
}
