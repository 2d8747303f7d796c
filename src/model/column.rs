// src/model/column.rs
use std::sync::{Arc, Weak};

use crate::cursor::names::{self, nullable};
use crate::cursor::MetaRow;
use crate::model::Table;

/// A table column.
#[derive(Debug)]
pub struct Column {
    table: Weak<Table>,
    /// Column name (case-sensitive identity within the table)
    pub name: String,
    /// 1-based position in the table
    pub ordinal: i32,
    /// Driver SQL type code
    pub type_code: i32,
    /// Declared type name
    pub type_name: String,
    pub max_length: i64,
    pub scale: i32,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub auto_increment: bool,
}

impl Column {
    /// Build a column from a columns-scan row.
    ///
    /// `NULLABLE` wins when reported; otherwise `IS_NULLABLE = "YES"` decides.
    pub fn from_row(table: &Arc<Table>, row: &MetaRow) -> Self {
        let nullable = if row.has(names::NULLABLE) {
            match row.safe_get_int(names::NULLABLE) {
                nullable::NO_NULLS => false,
                nullable::NULLABLE => true,
                _ => row
                    .safe_get_string(names::IS_NULLABLE)
                    .eq_ignore_ascii_case("YES"),
            }
        } else {
            row.safe_get_string(names::IS_NULLABLE)
                .eq_ignore_ascii_case("YES")
        };

        Self {
            table: Arc::downgrade(table),
            name: row.safe_get_string(names::COLUMN_NAME),
            ordinal: row.safe_get_int(names::ORDINAL_POSITION),
            type_code: row.safe_get_int(names::DATA_TYPE),
            type_name: row.safe_get_string(names::TYPE_NAME),
            max_length: row.safe_get_long(names::COLUMN_SIZE),
            scale: row.safe_get_int(names::DECIMAL_DIGITS),
            nullable,
            default_value: row.get_non_empty(names::COLUMN_DEF),
            description: row.get_non_empty(names::REMARKS),
            auto_increment: row.safe_get_boolean(names::IS_AUTOINCREMENT),
        }
    }

    /// Owning table, while it is alive.
    pub fn table(&self) -> Option<Arc<Table>> {
        self.table.upgrade()
    }
}
