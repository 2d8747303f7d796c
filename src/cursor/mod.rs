//! Metadata cursor adapter.
//!
//! A uniform wrapper over vendor metadata result sets. Every structural load
//! in the crate goes through [`DatabaseMetaData::describe`], which takes a
//! vendor-neutral [`MetaRequest`] and returns a forward-only stream of
//! [`MetaRow`]s.
//!
//! # Defaulting policy
//!
//! Drivers routinely omit optional columns, so the `safe_get_*` accessors on
//! [`MetaRow`] never fail: a missing or null field reads as `""`, `0`, `0`
//! or `false`. The structure graph is built best-effort from whatever the
//! driver reports.
//!
//! ```text
//! MetaRequest::ImportedKeys { scope, table }
//!        │
//!        ▼
//! DatabaseMetaData::describe ──► RowStream ──► MetaRow::safe_get_string("PKTABLE_NAME")
//! ```

pub mod names;
mod request;
mod row;

pub use request::{MetaRequest, Scope};
pub use row::{FieldValue, MetaRow};

use crate::error::MetaResult;

/// Forward-only stream of metadata rows.
pub type RowStream<'a> = Box<dyn Iterator<Item = MetaResult<MetaRow>> + 'a>;

/// Source of raw structural metadata.
///
/// Implementations map each request onto whatever the vendor offers
/// (JDBC-style metadata calls, catalog queries, pragmas). Requests a source
/// cannot answer return [`crate::MetaError::Unsupported`].
pub trait DatabaseMetaData {
    /// Run a describe request.
    fn describe(&self, request: &MetaRequest) -> MetaResult<RowStream<'_>>;
}

/// Wrap an already materialized row set as a stream.
pub fn row_stream<'a>(rows: Vec<MetaRow>) -> RowStream<'a> {
    Box::new(rows.into_iter().map(Ok))
}
