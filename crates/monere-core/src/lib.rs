//! # Monere Core
//!
//! Domain types and rule definitions for the monere cryptocurrency alerting engine.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `config.json` loading and home directory resolution |
//! | [`domain`] | Quotes, id map listings, historical bars, symbols, timestamps |
//! | [`error`] | Validation and core error types |
//! | [`history`] | Historical CSV export import |
//! | [`payload`] | Cached CoinMarketCap response decoding |
//! | [`rules`] | Range and variability rules, rule documents, durations |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use monere_core::{Config, RuleSet};
//!
//! let config = Config::load_default()?;
//! let rules = RuleSet::load(&config.rules_path())?;
//! for rule in rules.variability_rules() {
//!     println!("{} over {} days", rule.currency(), rule.duration_days());
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod payload;
pub mod rules;

pub use config::{resolve_monere_home, Config, HistoryMode};
pub use domain::{parse_date, CurrencyListing, HistoryBar, Platform, Quote, Symbol, UtcDateTime};
pub use error::{CoreError, RuleSection, ValidationError};
pub use history::{read_history, read_history_file};
pub use payload::{decode_map, decode_quotes, read_map_file, read_quotes_file};
pub use rules::{
    parse_duration_days, CurrencyFilter, RangeRule, RuleSet, VariabilityCriteria,
    VariabilityRule, SAMPLE_RULES,
};
