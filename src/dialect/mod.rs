//! Per-vendor metadata strategies.
//!
//! The structure graph and the key resolver only ever talk to a
//! `dyn Dialect`. A dialect overrides the handful of places where vendors
//! disagree: how a tables-scan row becomes a descriptor, where unique keys
//! come from, and how a table finds its triggers.
//!
//! | dialect   | unique keys                  | table triggers                        |
//! |-----------|------------------------------|---------------------------------------|
//! | `generic` | primary-key listing          | owner's triggers filtered by table    |
//! | `mysql`   | `PRIMARY KEY`/`UNIQUE` list  | per-table listing resolved via owner  |

mod generic;
mod mysql;

pub use generic::GenericDialect;
pub use mysql::{strip_innodb_comment, MySqlDialect};

use std::fmt;
use std::sync::Arc;

use crate::cache::Load;
use crate::cursor::{names, MetaRequest, MetaRow, Scope};
use crate::error::MetaResult;
use crate::model::{ConstraintKind, Table, TableDescriptor, Trigger};
use crate::monitor::ProgressMonitor;

/// One row of a unique-key listing, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumnRow {
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub column: String,
    pub key_seq: i32,
}

/// Vendor-specific behaviour of the structure graph.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Quote one identifier for generated SQL.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Build a table descriptor from a tables-scan row.
    fn table_descriptor(&self, row: &MetaRow) -> TableDescriptor {
        TableDescriptor::from_row(row)
    }

    /// Request listing the primary/unique key columns of a table.
    fn unique_keys_request(&self, scope: Scope, table: &str) -> MetaRequest {
        MetaRequest::PrimaryKeys {
            scope,
            table: table.to_string(),
        }
    }

    /// Decode a unique-key row; `None` skips the row.
    fn unique_key_row(&self, row: &MetaRow) -> Option<KeyColumnRow> {
        Some(KeyColumnRow {
            name: row.get_non_empty(names::PK_NAME),
            kind: ConstraintKind::PrimaryKey,
            column: row.safe_get_string(names::COLUMN_NAME),
            key_seq: row.safe_get_int(names::KEY_SEQ),
        })
    }

    /// Triggers attached to a table.
    fn load_table_triggers(
        &self,
        table: &Arc<Table>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Load<Vec<Arc<Trigger>>>> {
        let owner = table.owner()?;
        let triggers = owner
            .triggers(monitor)?
            .iter()
            .filter(|t| t.table_name.as_deref() == Some(table.name()))
            .cloned()
            .collect();
        Ok(Load::new(triggers, monitor.is_canceled()))
    }
}

/// Look up a dialect by its configured name.
pub fn by_name(name: &str) -> Option<Arc<dyn Dialect>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "generic" | "" => Some(Arc::new(GenericDialect)),
        "mysql" => Some(Arc::new(MySqlDialect)),
        _ => None,
    }
}
