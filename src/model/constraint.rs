// src/model/constraint.rs
use std::sync::{Arc, Weak};

use crate::model::{Column, ConstraintKind, Table};

/// A primary or unique key.
#[derive(Debug)]
pub struct Constraint {
    table: Weak<Table>,
    /// Constraint name; some drivers do not report one
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub columns: Vec<ConstraintColumn>,
    synthetic: bool,
}

/// One column of a key, with its 1-based key sequence.
#[derive(Debug, Clone)]
pub struct ConstraintColumn {
    pub column: Arc<Column>,
    pub key_seq: i32,
}

impl Constraint {
    pub fn new(table: &Arc<Table>, name: Option<String>, kind: ConstraintKind) -> Self {
        Self {
            table: Arc::downgrade(table),
            name,
            kind,
            columns: Vec::new(),
            synthetic: false,
        }
    }

    /// A key fabricated to anchor a foreign key whose real target could not
    /// be found. It is never part of the table's own constraint list.
    pub fn synthetic(table: &Arc<Table>, name: Option<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(table, name, ConstraintKind::PrimaryKey)
        }
    }

    pub fn table(&self) -> Option<Arc<Table>> {
        self.table.upgrade()
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Whether the key contains this exact column object.
    pub fn contains(&self, column: &Arc<Column>) -> bool {
        self.columns.iter().any(|c| Arc::ptr_eq(&c.column, column))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.name.as_str()).collect()
    }
}
