//! Error types for metadata loading.
//!
//! Two kinds of trouble exist while building the structure graph:
//!
//! - [`MetaError`]: I/O-level failures (query failed, connection dropped,
//!   unsupported capability). These abort the current load and are always
//!   surfaced to the caller.
//! - [`ResolutionWarning`]: row-level anomalies met while cross-referencing
//!   (a column or table that cannot be found). These are logged and the row
//!   is skipped; they never become errors.

use std::io;
use thiserror::Error;

/// Result type for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// Errors that abort a metadata load.
#[derive(Error, Debug)]
pub enum MetaError {
    /// A metadata query or connection failed.
    #[error("data access error: {message}")]
    DataAccess {
        /// Human-readable failure description.
        message: String,
    },

    /// The metadata source does not implement the requested call.
    #[error("metadata request not supported: {0}")]
    Unsupported(String),

    /// The requested operation is not available for this data source or target.
    #[error("{0}")]
    Capability(String),

    /// The data source was used before `initialize`.
    #[error("data source is not initialized")]
    NotInitialized,

    /// SQLite driver failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Snapshot document could not be parsed.
    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file could not be read.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl MetaError {
    /// Create a data access error.
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess {
            message: message.into(),
        }
    }

    /// Create a capability error.
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability(message.into())
    }

    /// Check if this error came from talking to the database.
    pub fn is_data_access(&self) -> bool {
        matches!(
            self,
            Self::DataAccess { .. }
                | Self::Unsupported(_)
                | Self::Sqlite(_)
                | Self::Json(_)
                | Self::Io(_)
        )
    }

    /// Check if this is a capability error.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability(_))
    }
}

/// A row-level anomaly met while cross-referencing metadata.
///
/// Logged through `tracing::warn!` and skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    PkTableNotFound { table: String },
    FkTableNotFound { table: String },
    PkColumnNotFound { table: String, column: String },
    FkColumnNotFound { table: String, column: String },
    UniqueKeyNotFound { table: String, key: String },
    PrimaryKeyFabricated { table: String },
    ForeignKeyNotFound { table: String, key: String },
    ConstraintColumnNotFound { table: String, column: String },
    IndexColumnNotFound { table: String, column: String },
    TriggerOwnerNotFound { owner: String },
    TriggerNotFound { owner: String, trigger: String },
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PkTableNotFound { table } => write!(f, "can't find PK table {}", table),
            Self::FkTableNotFound { table } => write!(f, "can't find FK table {}", table),
            Self::PkColumnNotFound { table, column } => {
                write!(f, "can't find PK table {} column {}", table, column)
            }
            Self::FkColumnNotFound { table, column } => {
                write!(f, "can't find FK table {} column {}", table, column)
            }
            Self::UniqueKeyNotFound { table, key } => {
                write!(f, "unique key '{}' not found in table {}", key, table)
            }
            Self::PrimaryKeyFabricated { table } => {
                write!(f, "could not find primary key for table {}", table)
            }
            Self::ForeignKeyNotFound { table, key } => {
                write!(f, "could not find foreign key '{}' for table {}", key, table)
            }
            Self::ConstraintColumnNotFound { table, column } => {
                write!(f, "column '{}' not found in table '{}' for key", column, table)
            }
            Self::IndexColumnNotFound { table, column } => {
                write!(f, "column '{}' not found in table '{}' for index", column, table)
            }
            Self::TriggerOwnerNotFound { owner } => {
                write!(f, "could not find trigger owner '{}'", owner)
            }
            Self::TriggerNotFound { owner, trigger } => {
                write!(f, "could not find trigger '{}' in '{}'", trigger, owner)
            }
        }
    }
}

impl ResolutionWarning {
    /// Log this anomaly.
    pub fn log(&self) {
        tracing::warn!(warning = %self, "metadata resolution anomaly");
    }
}
