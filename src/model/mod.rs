//! Structural entity graph.
//!
//! ```text
//! DataSource → [Catalog →] [Schema →] Table → Column / Index / Constraint
//!                                           → ForeignKey / Trigger
//! ```
//!
//! Ownership runs downwards through `Arc`; every back-reference (table to
//! container, column to table, key to table) is a `Weak`. Foreign keys hold
//! their referenced key and columns by `Arc`, which never forms a cycle
//! because keys and columns only point back weakly.
//!
//! Name lookups are exact and case-sensitive. Case folding is the data
//! source's business (see [`crate::config::MetaCase`]).

mod column;
mod constraint;
mod container;
mod foreign_key;
mod index;
mod kinds;
mod table;
mod trigger;

pub use column::Column;
pub use constraint::{Constraint, ConstraintColumn};
pub use container::{CacheScope, ColumnBatch, Container, ContainerKind};
pub use foreign_key::{ForeignKey, ForeignKeyColumn};
pub use index::{Index, IndexColumn};
pub use kinds::{
    classify_table_type, CascadeRule, ColumnLoadScope, ConstraintKind, Deferrability, IndexType,
};
pub use table::{Table, TableDescriptor, TypeInfo};
pub use trigger::Trigger;

/// Join the present parts of a qualified table name with `.`.
pub fn full_table_name(catalog: Option<&str>, schema: Option<&str>, table: &str) -> String {
    [catalog, schema, Some(table)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
