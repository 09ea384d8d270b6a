//! Pre-authored maintenance scripts run through [`crate::Warehouse::execute_script`].

use std::fmt::{Display, Formatter};

/// A named script. Callers pick a script; they never supply SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Keep the first row of every `(symbol, percent_change, duration_days)` triple.
    DedupeVariabilityRules,
    /// Keep the first row of every `(cmc_id, last_updated)` observation.
    DedupeQuotes,
}

impl Script {
    pub const ALL: [Script; 2] = [Self::DedupeVariabilityRules, Self::DedupeQuotes];

    pub const fn name(self) -> &'static str {
        match self {
            Self::DedupeVariabilityRules => "dedupe_variability_rules",
            Self::DedupeQuotes => "dedupe_quotes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|script| script.name() == name)
    }

    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::DedupeVariabilityRules => {
                r"
DELETE FROM alert_variability_rule
WHERE rule_id NOT IN (
    SELECT MIN(rule_id)
    FROM alert_variability_rule
    GROUP BY symbol, percent_change, duration_days
);
"
            }
            Self::DedupeQuotes => {
                r"
DELETE FROM quote
WHERE quote_id NOT IN (
    SELECT MIN(quote_id)
    FROM quote
    GROUP BY cmc_id, last_updated
);
"
            }
        }
    }
}

impl Display for Script {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for script in Script::ALL {
            assert_eq!(Script::from_name(script.name()), Some(script));
        }
        assert_eq!(Script::from_name("drop_everything"), None);
    }
}
