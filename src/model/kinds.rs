// src/model/kinds.rs
//! Closed taxonomies decoded from vendor metadata codes.

use serde::{Deserialize, Serialize};

use crate::cursor::names::{deferrability, index_type, rule};

/// Kind of a table-level key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    UniqueKey,
}

impl ConstraintKind {
    /// Decode a vendor `CONSTRAINT_TYPE` string.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PRIMARY KEY" | "PRIMARY" => Some(Self::PrimaryKey),
            "UNIQUE" | "UNIQUE KEY" => Some(Self::UniqueKey),
            _ => None,
        }
    }
}

/// Referential action of a foreign key on update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeRule {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    Unknown,
}

impl CascadeRule {
    /// Map a driver rule code; unrecognized codes are `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            rule::NO_ACTION => Self::NoAction,
            rule::CASCADE => Self::Cascade,
            rule::SET_NULL => Self::SetNull,
            rule::SET_DEFAULT => Self::SetDefault,
            rule::RESTRICT => Self::Restrict,
            _ => Self::Unknown,
        }
    }

    /// SQL spelling of the rule, for display.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Whether constraint checking can be postponed to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deferrability {
    InitiallyDeferred,
    InitiallyImmediate,
    NotDeferrable,
    Unknown,
}

impl Deferrability {
    pub fn from_code(code: i32) -> Self {
        match code {
            deferrability::INITIALLY_DEFERRED => Self::InitiallyDeferred,
            deferrability::INITIALLY_IMMEDIATE => Self::InitiallyImmediate,
            deferrability::NOT_DEFERRABLE => Self::NotDeferrable,
            _ => Self::Unknown,
        }
    }
}

/// Physical index organisation reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    Statistic,
    Clustered,
    Hashed,
    Other,
    Unknown,
}

impl IndexType {
    pub fn from_code(code: i32) -> Self {
        match code {
            index_type::STATISTIC => Self::Statistic,
            index_type::CLUSTERED => Self::Clustered,
            index_type::HASHED => Self::Hashed,
            index_type::OTHER => Self::Other,
            _ => Self::Unknown,
        }
    }
}

/// Granularity of column loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnLoadScope {
    /// One columns scan per table.
    #[default]
    Table,
    /// One columns scan per container, fanned out to every table.
    Container,
}

/// View/system flags derived from a vendor table type string.
///
/// Matching is a case-insensitive substring test, so a type can be both.
pub fn classify_table_type(type_name: &str) -> (bool, bool) {
    let upper = type_name.to_uppercase();
    (upper.contains("VIEW"), upper.contains("SYSTEM"))
}
