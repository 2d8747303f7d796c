// src/model/index.rs
use std::sync::{Arc, Weak};

use crate::model::{Column, IndexType, Table};

/// A table index.
#[derive(Debug)]
pub struct Index {
    table: Weak<Table>,
    pub name: String,
    pub unique: bool,
    /// Index catalog qualifier, when the driver reports one
    pub qualifier: Option<String>,
    pub index_type: IndexType,
    /// Columns in row arrival order
    pub columns: Vec<IndexColumn>,
}

/// One column of an index.
#[derive(Debug, Clone)]
pub struct IndexColumn {
    pub column: Arc<Column>,
    pub ordinal: i32,
    pub ascending: bool,
}

impl Index {
    pub fn new(
        table: &Arc<Table>,
        name: String,
        unique: bool,
        qualifier: Option<String>,
        index_type: IndexType,
    ) -> Self {
        Self {
            table: Arc::downgrade(table),
            name,
            unique,
            qualifier,
            index_type,
            columns: Vec::new(),
        }
    }

    pub fn table(&self) -> Option<Arc<Table>> {
        self.table.upgrade()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.name.as_str()).collect()
    }
}
