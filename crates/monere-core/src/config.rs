//! Runtime configuration stored as `config.json` in the monere home directory.

use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DATABASE_FILE_NAME: &str = "monere.duckdb";
pub const DEFAULT_SYMBOLS: [&str; 4] = ["BTC", "ETH", "BCH", "XMR"];

/// How the variability evaluator treats a series shorter than the rule window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Compare against the earliest observation when the window is not covered.
    #[default]
    Fallback,
    /// Skip the series and count it as a data gap.
    Strict,
}

impl HistoryMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Strict => "strict",
        }
    }
}

impl Display for HistoryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown history mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
    #[serde(default)]
    pub alerts_path: Option<PathBuf>,
    #[serde(default)]
    pub history_mode: HistoryMode,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
    #[serde(skip)]
    home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_home(resolve_monere_home())
    }
}

impl Config {
    /// Defaults rooted at `home` instead of the resolved monere home.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            data_dir: None,
            symbols: default_symbols(),
            rules_path: None,
            alerts_path: None,
            history_mode: HistoryMode::default(),
            max_pool_size: default_max_pool_size(),
            home,
        }
    }

    /// Load `config.json` from the resolved monere home.
    pub fn load_default() -> Result<Self, CoreError> {
        Self::load(&resolve_monere_home())
    }

    /// Load `config.json` from `home`; a missing file yields defaults.
    pub fn load(home: &Path) -> Result<Self, CoreError> {
        let path = home.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::with_home(home));
        }

        let content = fs::read_to_string(&path).map_err(|error| CoreError::io(&path, error))?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.home = home.to_path_buf();
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write the config back to `<home>/config.json`, creating the directory.
    pub fn save(&self) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.home).map_err(|error| CoreError::io(&self.home, error))?;
        let path = self.config_path();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|error| CoreError::io(&path, error))?;
        Ok(path)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or(&self.home)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE_NAME)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.rules_path
            .clone()
            .unwrap_or_else(|| self.home.join("alert_rules.json"))
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.alerts_path
            .clone()
            .unwrap_or_else(|| self.home.join("alerts"))
    }
}

/// `MONERE_HOME`, else `$HOME/.config/monere`, else `.monere`.
pub fn resolve_monere_home() -> PathBuf {
    if let Some(path) = env::var_os("MONERE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join("monere");
    }

    PathBuf::from(".monere")
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|symbol| (*symbol).to_owned()).collect()
}

fn default_max_pool_size() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let home = tempfile::tempdir().expect("tempdir");
        let config = Config::load(home.path()).expect("defaults");

        assert_eq!(config.data_dir(), home.path());
        assert_eq!(config.symbols, vec!["BTC", "ETH", "BCH", "XMR"]);
        assert_eq!(config.history_mode, HistoryMode::Fallback);
        assert_eq!(config.rules_path(), home.path().join("alert_rules.json"));
        assert_eq!(config.alerts_path(), home.path().join("alerts"));
        assert_eq!(config.database_path(), home.path().join("monere.duckdb"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let home = tempfile::tempdir().expect("tempdir");
        fs::write(
            home.path().join(CONFIG_FILE_NAME),
            r#"{"history_mode": "strict", "symbols": ["XMR"]}"#,
        )
        .expect("write config");

        let config = Config::load(home.path()).expect("config");
        assert_eq!(config.history_mode, HistoryMode::Strict);
        assert_eq!(config.symbols, vec!["XMR"]);
        assert_eq!(config.max_pool_size, 4);
        assert_eq!(config.home(), home.path());
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let home = tempfile::tempdir().expect("tempdir");
        let mut config = Config::with_home(home.path());
        config.history_mode = HistoryMode::Strict;
        config.alerts_path = Some(home.path().join("out.txt"));

        let path = config.save().expect("save");
        assert_eq!(path, home.path().join(CONFIG_FILE_NAME));

        let loaded = Config::load(home.path()).expect("reload");
        assert_eq!(loaded, config);
    }

    #[test]
    fn history_mode_parses_case_insensitively() {
        assert_eq!("STRICT".parse::<HistoryMode>(), Ok(HistoryMode::Strict));
        assert!("lenient".parse::<HistoryMode>().is_err());
    }
}
