//! Driver parameters.
//!
//! Vendor-specific behaviour that cannot be discovered from metadata is
//! configured per driver as plain string parameters:
//!
//! - `query-get-active-db`: query returning the active catalog/schema name
//! - `query-set-active-db`: statement switching it; the first `?` is replaced
//!   by the target name
//! - `meta-case`: name case folding (`none`, `upper`, `lower`)
//! - `shutdown-url-param`: URL suffix passed to the driver on close

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PARAM_QUERY_GET_ACTIVE_DB: &str = "query-get-active-db";
pub const PARAM_QUERY_SET_ACTIVE_DB: &str = "query-set-active-db";
pub const PARAM_META_CASE: &str = "meta-case";
pub const PARAM_SHUTDOWN_URL_PARAM: &str = "shutdown-url-param";

/// Name case folding applied to identifiers before lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaCase {
    #[default]
    None,
    Upper,
    Lower,
}

impl MetaCase {
    /// Parse a case policy.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Some(MetaCase::None),
            "UPPER" => Some(MetaCase::Upper),
            "LOWER" => Some(MetaCase::Lower),
            _ => None,
        }
    }

    /// Fold a name according to this policy.
    pub fn transform(&self, name: &str) -> String {
        match self {
            MetaCase::None => name.to_string(),
            MetaCase::Upper => name.to_uppercase(),
            MetaCase::Lower => name.to_lowercase(),
        }
    }
}

/// String key → value driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverParams(BTreeMap<String, String>);

impl DriverParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Parameter value; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn query_get_active_db(&self) -> Option<&str> {
        self.get(PARAM_QUERY_GET_ACTIVE_DB)
    }

    pub fn query_set_active_db(&self) -> Option<&str> {
        self.get(PARAM_QUERY_SET_ACTIVE_DB)
    }

    pub fn shutdown_url_param(&self) -> Option<&str> {
        self.get(PARAM_SHUTDOWN_URL_PARAM)
    }

    /// Name case policy; unknown values fall back to [`MetaCase::None`].
    pub fn meta_case(&self) -> MetaCase {
        match self.get(PARAM_META_CASE) {
            None => MetaCase::None,
            Some(value) => MetaCase::from_str(value).unwrap_or_else(|| {
                warn!(value, "unknown meta-case parameter, using none");
                MetaCase::None
            }),
        }
    }
}
