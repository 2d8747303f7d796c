//! Configuration module.
//!
//! Handles driver parameters, name-case policy, and the TOML settings file.

mod params;
mod settings;

pub use params::{DriverParams, MetaCase};
pub use settings::{
    expand_env_vars, DataSourceSettings, LoggingSettings, Settings, SettingsError, SourceKind,
};
