//! `AppConfig` struct and TOML loading.

use std::path::{Path, PathBuf};

use epgrec_finder_db::{DatabaseConfig, ExclusionRule, TableNames};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Exclusion rules, in file order.
    #[serde(default)]
    pub excludes: Vec<ExclusionRule>,
}

/// Errors raised while loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file is missing or unreadable.
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the schema.
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// `database.table_prefix` contains characters other than `[A-Za-z0-9_]`.
    InvalidTablePrefix(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, .. } => write!(f, "failed to read {}", path.display()),
            Self::Parse { path, .. } => write!(f, "failed to parse {}", path.display()),
            Self::InvalidTablePrefix(prefix) => {
                write!(f, "invalid database.table_prefix: {prefix:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidTablePrefix(_) => None,
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, cannot be parsed, or
    /// has an invalid table prefix.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.table_names()?;
        Ok(config)
    }

    /// Returns the epgrec table names for the configured prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is not a plain identifier.
    pub fn table_names(&self) -> Result<TableNames, ConfigError> {
        let prefix = &self.database.table_prefix;
        TableNames::with_prefix(prefix)
            .ok_or_else(|| ConfigError::InvalidTablePrefix(prefix.clone()))
    }
}
