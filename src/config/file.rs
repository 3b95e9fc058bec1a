use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HOPBENCH_CONFIG";
/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "hopbench.toml";

/// Scalar values of a TOML config file, flattened to strings.
///
/// Top-level keys apply to every benchmark; a table named after a benchmark
/// (`[ring]`, `[books]`) overrides them for that benchmark only.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    path: Option<PathBuf>,
    shared: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl FileConfig {
    /// Finds the config file: the explicit path, then `HOPBENCH_CONFIG`, then
    /// `./hopbench.toml`, then the per-user config directory. Missing optional
    /// locations yield an empty config; a missing explicit file is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads and flattens one TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents, path)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Flattens TOML `contents`; `path` is only used in error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };
        for (key, value) in table {
            match value {
                toml::Value::Table(section) => {
                    let mut entries = BTreeMap::new();
                    for (inner, value) in section {
                        let scalar = scalar(&value).ok_or_else(|| ConfigError::Unsupported {
                            path: path.to_path_buf(),
                            key: format!("{key}.{inner}"),
                        })?;
                        entries.insert(inner, scalar);
                    }
                    config.sections.insert(key, entries);
                }
                other => {
                    let scalar = scalar(&other).ok_or_else(|| ConfigError::Unsupported {
                        path: path.to_path_buf(),
                        key: key.clone(),
                    })?;
                    config.shared.insert(key, scalar);
                }
            }
        }
        Ok(config)
    }

    /// File the values came from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Value of `key` for `section`, falling back to the top-level keys.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .or_else(|| self.shared.get(key))
            .map(String::as_str)
    }
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Per-user config location, e.g. `~/.config/hopbench/hopbench.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("hopbench").join(LOCAL_CONFIG_FILE))
}
