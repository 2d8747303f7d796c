// src/model/foreign_key.rs
use std::sync::{Arc, Weak};

use crate::model::{CascadeRule, Column, Constraint, Deferrability, Table};

/// A foreign key defined on a table.
#[derive(Debug)]
pub struct ForeignKey {
    table: Weak<Table>,
    pub name: Option<String>,
    /// Key on the referenced table (possibly synthetic)
    pub referenced_key: Arc<Constraint>,
    pub delete_rule: CascadeRule,
    pub update_rule: CascadeRule,
    pub deferrability: Deferrability,
    /// Column pairs ordered by key sequence
    pub columns: Vec<ForeignKeyColumn>,
}

/// A (local column, key sequence, referenced column) triple.
#[derive(Debug, Clone)]
pub struct ForeignKeyColumn {
    pub column: Arc<Column>,
    pub key_seq: i32,
    pub referenced_column: Arc<Column>,
}

impl ForeignKey {
    pub fn new(
        table: &Arc<Table>,
        name: Option<String>,
        referenced_key: Arc<Constraint>,
        delete_rule: CascadeRule,
        update_rule: CascadeRule,
        deferrability: Deferrability,
    ) -> Self {
        Self {
            table: Arc::downgrade(table),
            name,
            referenced_key,
            delete_rule,
            update_rule,
            deferrability,
            columns: Vec::new(),
        }
    }

    /// Table the key is defined on.
    pub fn table(&self) -> Option<Arc<Table>> {
        self.table.upgrade()
    }

    /// Table the key points at.
    pub fn referenced_table(&self) -> Option<Arc<Table>> {
        self.referenced_key.table()
    }

    pub fn name_matches(&self, name: Option<&str>) -> bool {
        self.name.as_deref() == name
    }
}
