//! TOML-based configuration for genmeta.
//!
//! Supports a config file (genmeta.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [logging]
//! level = "info"
//!
//! [data_sources.shop]
//! source = "sqlite"
//! path = "${SHOP_DB}"
//! dialect = "generic"
//! column_load = "container"
//!
//! [data_sources.crm]
//! source = "snapshot"
//! path = "./fixtures/crm.json"
//! dialect = "mysql"
//! catalog_filter = "crm%"
//!
//! [data_sources.crm.params]
//! query-get-active-db = "SELECT DATABASE()"
//! query-set-active-db = "USE ?"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::params::DriverParams;
use crate::datasource::DataSourceConfig;
use crate::model::ColumnLoadScope;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Data source not found: {0}")]
    DataSourceNotFound(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named data sources.
    pub data_sources: BTreeMap<String, DataSourceSettings>,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Kind of metadata source backing a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// SQLite database file.
    #[default]
    Sqlite,
    /// JSON snapshot of raw metadata rows.
    Snapshot,
}

/// Data source configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSourceSettings {
    /// Metadata source kind.
    pub source: SourceKind,

    /// Path to the database or snapshot file (supports ${ENV_VAR} expansion).
    pub path: String,

    /// Vendor dialect name ("generic", "mysql").
    pub dialect: Option<String>,

    /// Comma-separated LIKE patterns for catalogs.
    pub catalog_filter: String,

    /// Comma-separated LIKE patterns for schemas.
    pub schema_filter: String,

    /// Column load granularity.
    pub column_load: ColumnLoadScope,

    /// Driver parameters.
    pub params: DriverParams,
}

impl DataSourceSettings {
    /// Get the path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        if self.path.trim().is_empty() {
            return Err(SettingsError::InvalidConfig("data source path is empty".into()));
        }
        Ok(PathBuf::from(expand_env_vars(&self.path)?))
    }

    /// Dialect name, defaulting to "generic".
    pub fn dialect_name(&self) -> &str {
        self.dialect.as_deref().unwrap_or("generic")
    }

    /// Build the facade configuration for this data source.
    pub fn to_config(&self, name: &str) -> DataSourceConfig {
        DataSourceConfig::new(name)
            .with_catalog_filter(&self.catalog_filter)
            .with_schema_filter(&self.schema_filter)
            .with_column_load(self.column_load)
            .with_params(self.params.clone())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Default user config file: `~/.genmeta/genmeta.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".genmeta").join("genmeta.toml"))
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `GENMETA_CONFIG`
    /// 2. `./genmeta.toml`
    /// 3. `~/.genmeta/genmeta.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("GENMETA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("genmeta.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(user_config) = Self::default_path() {
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a data source by name.
    pub fn data_source(&self, name: &str) -> Result<&DataSourceSettings, SettingsError> {
        self.data_sources
            .get(name)
            .ok_or_else(|| SettingsError::DataSourceNotFound(name.to_string()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
