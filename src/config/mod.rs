//! Layered benchmark configuration.
//!
//! A value is looked up, in order, in the explicit overrides, the process
//! environment (`HOPBENCH_<SECTION>_<KEY>`), the TOML config file (the
//! benchmark's table first, then top-level keys) and finally the hard-coded
//! default supplied by the caller. Snapshots built from a [`Settings`] never
//! go back to it afterwards.

mod bench;
mod file;

pub use bench::{BooksConfig, FavoritesKind, ProgressStyleKind, RingConfig, StoreSettings};
pub use file::{default_config_path, FileConfig, CONFIG_ENV, LOCAL_CONFIG_FILE};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Prefix shared by every environment variable the resolver reads.
pub const ENV_PREFIX: &str = "HOPBENCH";

/// Errors raised while resolving configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// The config file holds a value that is not a scalar.
    #[error("config {path}: key '{key}' must be a string, number or boolean")]
    Unsupported {
        /// File path.
        path: PathBuf,
        /// Offending key.
        key: String,
    },
    /// A value failed to parse as the type its key requires.
    #[error("value '{value}' for '{key}' is not a valid {expected}")]
    InvalidValue {
        /// Key being resolved.
        key: String,
        /// Raw value found.
        value: String,
        /// Type that was expected.
        expected: &'static str,
    },
    /// An override was not written as `key=value`.
    #[error("override '{0}' must look like key=value")]
    InvalidOverride(String),
}

/// Raw key/value layers for one benchmark section (`ring`, `books`).
#[derive(Debug, Clone, Default)]
pub struct Settings {
    section: String,
    overrides: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
    file: FileConfig,
}

impl Settings {
    /// Empty layers for `section`; every lookup falls through to defaults.
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            ..Self::default()
        }
    }

    /// Full cascade: overrides, process environment, discovered config file.
    pub fn load<I>(
        section: &str,
        explicit_file: Option<&Path>,
        overrides: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let file = FileConfig::discover(explicit_file)?;
        Ok(Self::new(section)
            .with_file(file)
            .with_env(std::env::vars())
            .with_overrides(overrides))
    }

    /// Section name used for file tables and environment variables.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Adds one explicit override.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Adds explicit overrides; later pairs win.
    pub fn with_overrides<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.overrides.extend(pairs);
        self
    }

    /// Captures the environment variables carrying the crate prefix.
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{ENV_PREFIX}_");
        self.env = vars
            .into_iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .collect();
        self
    }

    /// Uses `file` as the file layer.
    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.file = file;
        self
    }

    /// Whether an explicit override exists for `key`.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Raw value of `key` from the highest layer that has it.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.overrides.get(key) {
            return Some(value);
        }
        if let Some(value) = self.env.get(&env_var_name(&self.section, key)) {
            return Some(value);
        }
        self.file.get(&self.section, key)
    }

    /// String value, or `default`.
    pub fn string(&self, key: &str, default: &str) -> String {
        self.lookup(key).unwrap_or(default).trim().to_string()
    }

    /// Parsed value, or `default` when no layer has the key.
    pub fn parsed<T: FromStr>(
        &self,
        key: &str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        Ok(self.optional(key, expected)?.unwrap_or(default))
    }

    /// Parsed value, or `None` when no layer has the key.
    pub fn optional<T: FromStr>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                    expected,
                }),
        }
    }

    /// Integer value, or `default`.
    pub fn int(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        self.parsed(key, default, "integer")
    }

    /// Boolean value, or `default`. Accepts true/false, yes/no, on/off, 1/0.
    pub fn boolean(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.lookup(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                expected: "boolean",
            }),
        }
    }
}

/// Splits a `key=value` override.
pub fn parse_override(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidOverride(raw.to_string())),
    }
}

/// Environment variable consulted for `key` in `section`:
/// `numBooks` in `books` becomes `HOPBENCH_BOOKS_NUM_BOOKS`.
pub fn env_var_name(section: &str, key: &str) -> String {
    let mut name = format!("{ENV_PREFIX}_{}_", section.to_ascii_uppercase());
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            name.push('_');
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        if ch == '-' || ch == '.' {
            name.push('_');
        } else {
            name.push(ch.to_ascii_uppercase());
        }
    }
    name
}
