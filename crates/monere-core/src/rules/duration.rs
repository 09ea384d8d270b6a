//! Human-readable rule durations ("3days", "2weeks") normalized to days.

use crate::ValidationError;

/// Recognized units in match priority order, with their length in days.
pub const UNIT_DAYS: [(&str, f64); 4] = [
    ("day", 1.0),
    ("week", 7.0),
    ("month", 30.0),
    ("year", 365.0),
];

/// Convert a duration such as `"3days"` or `"1 Month"` into a day count.
///
/// A single trailing `s` is dropped and the input is case-folded before
/// matching. The first unit that splits the input in two with a finite,
/// non-negative numeric prefix wins; whatever follows the keyword is ignored.
pub fn parse_duration_days(input: &str) -> Result<f64, ValidationError> {
    let lowered = input.trim().to_lowercase();
    let singular = lowered.strip_suffix('s').unwrap_or(&lowered);

    for (unit, days) in UNIT_DAYS {
        let parts = singular.split(unit).collect::<Vec<_>>();
        let [amount, _] = parts.as_slice() else {
            continue;
        };
        let amount = amount.trim();
        if amount.is_empty() {
            continue;
        }
        match amount.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => return Ok(value * days),
            _ => continue,
        }
    }

    Err(ValidationError::InvalidDuration {
        value: input.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_each_unit_to_days() {
        assert_eq!(parse_duration_days("3days"), Ok(3.0));
        assert_eq!(parse_duration_days("2weeks"), Ok(14.0));
        assert_eq!(parse_duration_days("1month"), Ok(30.0));
        assert_eq!(parse_duration_days("1year"), Ok(365.0));
    }

    #[test]
    fn accepts_singular_mixed_case_and_spacing() {
        assert_eq!(parse_duration_days("1Day"), Ok(1.0));
        assert_eq!(parse_duration_days(" 6 MONTHS "), Ok(180.0));
        assert_eq!(parse_duration_days("1.5weeks"), Ok(10.5));
    }

    #[test]
    fn rejects_unknown_units() {
        for input in ["xyz", "3hours", "", "days"] {
            let err = parse_duration_days(input).expect_err("must fail");
            assert!(
                matches!(err, ValidationError::InvalidDuration { .. }),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_numeric_or_negative_amounts() {
        assert!(parse_duration_days("threedays").is_err());
        assert!(parse_duration_days("-3days").is_err());
        assert!(parse_duration_days("infdays").is_err());
    }

    #[test]
    fn ignores_text_after_the_unit_keyword() {
        assert_eq!(parse_duration_days("3dayz"), Ok(3.0));
        assert_eq!(parse_duration_days("2 weeks ago"), Ok(14.0));
    }
}
