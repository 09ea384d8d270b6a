use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{CoreError, RuleSection, Symbol, ValidationError};

use super::model::{CurrencyFilter, RangeRule, RuleSet, VariabilityRule};

/// Rule document written by `monere init` when none exists yet.
pub const SAMPLE_RULES: &str = r#"{
  "range-rules": [
    { "currency": "BTC", "low": 60000, "high": 120000 },
    { "currency": "XMR", "low": 250, "high": 450 }
  ],
  "variability-rules": [
    { "currency": "XMR", "percent_change": 25, "duration": "30days" },
    { "percent_change": 40, "duration": "2weeks" }
  ]
}
"#;

#[derive(Debug, Deserialize)]
struct RawRuleDocument {
    #[serde(rename = "range-rules")]
    range_rules: Option<Vec<RawRangeRule>>,
    #[serde(rename = "variability-rules")]
    variability_rules: Option<Vec<RawVariabilityRule>>,
}

#[derive(Debug, Deserialize)]
struct RawRangeRule {
    currency: Option<String>,
    low: Option<f64>,
    high: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawVariabilityRule {
    currency: Option<String>,
    percent_change: Option<f64>,
    duration: Option<String>,
}

impl RuleSet {
    /// Read and validate a rule document from disk.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = fs::read_to_string(path).map_err(|error| CoreError::io(path, error))?;
        let rules = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            range_rules = rules.range_rules().len(),
            variability_rules = rules.variability_rules().len(),
            "loaded alert rules"
        );
        Ok(rules)
    }

    /// Parse and validate a rule document. Both top-level lists are required.
    pub fn from_json_str(content: &str) -> Result<Self, CoreError> {
        let document: RawRuleDocument = serde_json::from_str(content)?;

        let range_entries = document.range_rules.ok_or(ValidationError::MissingSection {
            section: RuleSection::Range,
        })?;
        let variability_entries =
            document
                .variability_rules
                .ok_or(ValidationError::MissingSection {
                    section: RuleSection::Variability,
                })?;

        let range_rules = range_entries
            .into_iter()
            .enumerate()
            .map(|(index, raw)| build_range_rule(index, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let variability_rules = variability_entries
            .into_iter()
            .enumerate()
            .map(|(index, raw)| build_variability_rule(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(range_rules, variability_rules))
    }
}

fn build_range_rule(index: usize, raw: RawRangeRule) -> Result<RangeRule, ValidationError> {
    let section = RuleSection::Range;
    let missing = |field| ValidationError::MissingField {
        section,
        index,
        field,
    };

    let currency = raw.currency.ok_or_else(|| missing("currency"))?;
    let low = raw.low.ok_or_else(|| missing("low"))?;
    let high = raw.high.ok_or_else(|| missing("high"))?;

    let currency = Symbol::parse(&currency).map_err(|error| error.in_rule(section, index))?;
    RangeRule::new(currency, low, high).map_err(|error| error.in_rule(section, index))
}

fn build_variability_rule(
    index: usize,
    raw: RawVariabilityRule,
) -> Result<VariabilityRule, ValidationError> {
    let section = RuleSection::Variability;
    let missing = |field| ValidationError::MissingField {
        section,
        index,
        field,
    };

    let percent_change = raw.percent_change.ok_or_else(|| missing("percent_change"))?;
    let duration = raw.duration.ok_or_else(|| missing("duration"))?;
    let currency = CurrencyFilter::from_optional(raw.currency.as_deref())
        .map_err(|error| error.in_rule(section, index))?;

    VariabilityRule::new(currency, percent_change, duration)
        .map_err(|error| error.in_rule(section, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(error: CoreError) -> ValidationError {
        match error {
            CoreError::Validation(inner) => inner,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn sample_rules_load() {
        let rules = RuleSet::from_json_str(SAMPLE_RULES).expect("sample must load");
        assert_eq!(rules.range_rules().len(), 2);
        assert_eq!(rules.variability_rules().len(), 2);
        assert_eq!(rules.variability_rules()[1].currency(), &CurrencyFilter::All);
    }

    #[test]
    fn empty_lists_yield_empty_rule_set() {
        let rules = RuleSet::from_json_str(r#"{"range-rules": [], "variability-rules": []}"#)
            .expect("empty document must load");
        assert!(rules.is_empty());
    }

    #[test]
    fn missing_top_level_list_fails() {
        let error = validation(
            RuleSet::from_json_str(r#"{"range-rules": []}"#).expect_err("must fail"),
        );
        assert_eq!(
            error,
            ValidationError::MissingSection {
                section: RuleSection::Variability
            }
        );
    }

    #[test]
    fn inverted_range_identifies_entry() {
        let error = validation(
            RuleSet::from_json_str(
                r#"{"range-rules": [
                    {"currency": "ETH", "low": 1, "high": 2},
                    {"currency": "BTC", "low": 100, "high": 50}
                ], "variability-rules": []}"#,
            )
            .expect_err("must fail"),
        );
        match error {
            ValidationError::InvalidRule {
                section,
                index,
                source,
            } => {
                assert_eq!(section, RuleSection::Range);
                assert_eq!(index, 1);
                assert!(matches!(*source, ValidationError::InvertedRange { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_range_field_is_reported() {
        let error = validation(
            RuleSet::from_json_str(
                r#"{"range-rules": [{"currency": "BTC", "low": 1}], "variability-rules": []}"#,
            )
            .expect_err("must fail"),
        );
        assert_eq!(
            error,
            ValidationError::MissingField {
                section: RuleSection::Range,
                index: 0,
                field: "high"
            }
        );
    }

    #[test]
    fn bad_duration_fails_the_load() {
        let error = validation(
            RuleSet::from_json_str(
                r#"{"range-rules": [], "variability-rules": [
                    {"currency": "XMR", "percent_change": 10, "duration": "fortnight"}
                ]}"#,
            )
            .expect_err("must fail"),
        );
        assert!(error.to_string().contains("variability-rules[0]"));
    }

    #[test]
    fn empty_currency_string_means_all() {
        let rules = RuleSet::from_json_str(
            r#"{"range-rules": [], "variability-rules": [
                {"currency": "", "percent_change": 10, "duration": "3days"}
            ]}"#,
        )
        .expect("must load");
        assert_eq!(rules.variability_rules()[0].currency(), &CurrencyFilter::All);
    }
}
