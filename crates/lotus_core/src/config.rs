//! Runtime configuration for the ritual core.
//!
//! # Responsibility
//! - Describe storage, logging and oracle settings in one value.
//! - Load settings from TOML and apply environment overrides.
//!
//! # Invariants
//! - Every field has a default except `data_dir`, which is only required
//!   when a durable database path is requested.
//! - `validate()` passes before a config is handed to other modules.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "lotus.sqlite3";
const DEFAULT_ORACLE_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_ORACLE_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for the external seed/analysis provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Provider API key. `None` makes every oracle call fall back.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_ORACLE_MODEL.to_string(),
            base_url: DEFAULT_ORACLE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_ORACLE_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LotusConfig {
    /// Directory holding the SQLite store.
    pub data_dir: Option<PathBuf>,
    pub db_file_name: String,
    /// `None` means [`default_log_level`].
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub oracle: OracleConfig,
}

impl Default for LotusConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            log_level: None,
            log_dir: None,
            oracle: OracleConfig::default(),
        }
    }
}

impl LotusConfig {
    /// Parses TOML and validates the result.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Applies overrides from the process environment.
    ///
    /// Recognized: `LOTUS_DATA_DIR`, `LOTUS_LOG_LEVEL`, `LOTUS_LOG_DIR`,
    /// `LOTUS_API_KEY` (falling back to `API_KEY`), `LOTUS_MODEL`,
    /// `LOTUS_ORACLE_BASE_URL`, `LOTUS_ORACLE_TIMEOUT_SECS`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary lookup; blank values are ignored.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("LOTUS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("LOTUS_LOG_LEVEL") {
            self.log_level = Some(value);
        }
        if let Some(value) = get("LOTUS_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("LOTUS_API_KEY").or_else(|| get("API_KEY")) {
            self.oracle.api_key = Some(value);
        }
        if let Some(value) = get("LOTUS_MODEL") {
            self.oracle.model = value;
        }
        if let Some(value) = get("LOTUS_ORACLE_BASE_URL") {
            self.oracle.base_url = value;
        }
        if let Some(value) = get("LOTUS_ORACLE_TIMEOUT_SECS") {
            self.oracle.timeout_secs = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "LOTUS_ORACLE_TIMEOUT_SECS must be a whole number, got `{value}`"
                ))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("db_file_name cannot be empty".to_string()));
        }
        if let Some(level) = &self.log_level {
            normalize_level(level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        if self.oracle.model.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.model cannot be empty".to_string()));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "oracle.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Full path of the SQLite store.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(&self.db_file_name))
            .ok_or_else(|| ConfigError::Invalid("data_dir is not set".to_string()))
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}
