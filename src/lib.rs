//! # genmeta
//!
//! A lazily-populated database structure graph reconciled from driver metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 DataSource (facade)                      │
//! │   topology: catalogs | schemas | flat container          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lazy containers]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Catalog → Schema → Table → Column / Index / Constraint │
//! │                            → ForeignKey / Trigger        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [key resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │     imported / exported key rows → PK ↔ FK graph         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [cursor adapter]
//! ┌─────────────────────────────────────────────────────────┐
//! │   DatabaseMetaData: describe(request) → rows             │
//! │   (SQLite source, JSON snapshot source, ...)             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every structural collection is loaded on first access and cached until the
//! owner is refreshed. Loads run synchronously on the calling thread and poll
//! the caller's [`monitor::ProgressMonitor`] for cancellation.

pub mod cache;
pub mod config;
pub mod cursor;
pub mod datasource;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod model;
pub mod monitor;
pub mod resolver;
pub mod session;
pub mod sources;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{DriverParams, MetaCase, Settings};
    pub use crate::datasource::{Child, DataSource, DataSourceConfig, Topology};
    pub use crate::dialect::{Dialect, GenericDialect, MySqlDialect};
    pub use crate::error::{MetaError, MetaResult};
    pub use crate::model::{
        CascadeRule, Column, ColumnLoadScope, Constraint, ConstraintKind, Container,
        ContainerKind, Deferrability, ForeignKey, Index, IndexType, Table, Trigger,
    };
    pub use crate::monitor::{CancelFlag, LoggingMonitor, NullMonitor, ProgressMonitor};
    pub use crate::session::{ContextProvider, ExecutionContext, Purpose};
}

pub use datasource::DataSource;
pub use error::{MetaError, MetaResult};
