//! Alert rule model, rule document loading, and duration parsing.

mod duration;
mod loader;
mod model;

pub use duration::{parse_duration_days, UNIT_DAYS};
pub use loader::SAMPLE_RULES;
pub use model::{CurrencyFilter, RangeRule, RuleSet, VariabilityCriteria, VariabilityRule};
