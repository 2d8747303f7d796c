//! Vendor-neutral describe requests.

use serde::{Deserialize, Serialize};

/// Catalog/schema qualifier of a request.
///
/// `None` means "do not narrow by this part".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl Scope {
    pub fn new(catalog: Option<String>, schema: Option<String>) -> Self {
        Self { catalog, schema }
    }

    /// Scope that narrows by nothing.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn catalog(name: impl Into<String>) -> Self {
        Self {
            catalog: Some(name.into()),
            schema: None,
        }
    }
}

/// A "describe X" request against the metadata source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaRequest {
    /// Table type names (`TABLE_TYPE`).
    TableTypes,
    /// Catalog names (`TABLE_CAT`).
    Catalogs,
    /// Schemas of a catalog, optionally narrowed by a LIKE pattern.
    Schemas {
        catalog: Option<String>,
        pattern: Option<String>,
    },
    /// Every schema the source knows, without catalog narrowing.
    AllSchemas,
    /// Tables in a scope; `table` narrows to one name.
    Tables { scope: Scope, table: Option<String> },
    /// Columns in a scope; `table = None` lists every table of the scope.
    Columns { scope: Scope, table: Option<String> },
    /// Primary key columns of one table.
    PrimaryKeys { scope: Scope, table: String },
    /// Primary and unique key columns of one table (vendor extension).
    UniqueKeys { scope: Scope, table: String },
    /// Foreign keys defined on one table.
    ImportedKeys { scope: Scope, table: String },
    /// Foreign keys elsewhere that reference one table.
    ExportedKeys { scope: Scope, table: String },
    /// Index columns of one table.
    IndexInfo {
        scope: Scope,
        table: String,
        unique_only: bool,
        approximate: bool,
    },
    /// Triggers owned by a container (vendor extension).
    Triggers { scope: Scope },
    /// Owner and name of the triggers attached to one table (vendor extension).
    TableTriggers { scope: Scope, table: String },
}

impl MetaRequest {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaRequest::TableTypes => "table_types",
            MetaRequest::Catalogs => "catalogs",
            MetaRequest::Schemas { .. } => "schemas",
            MetaRequest::AllSchemas => "all_schemas",
            MetaRequest::Tables { .. } => "tables",
            MetaRequest::Columns { .. } => "columns",
            MetaRequest::PrimaryKeys { .. } => "primary_keys",
            MetaRequest::UniqueKeys { .. } => "unique_keys",
            MetaRequest::ImportedKeys { .. } => "imported_keys",
            MetaRequest::ExportedKeys { .. } => "exported_keys",
            MetaRequest::IndexInfo { .. } => "index_info",
            MetaRequest::Triggers { .. } => "triggers",
            MetaRequest::TableTriggers { .. } => "table_triggers",
        }
    }

    /// Scope of the request, if it has one.
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            MetaRequest::Tables { scope, .. }
            | MetaRequest::Columns { scope, .. }
            | MetaRequest::PrimaryKeys { scope, .. }
            | MetaRequest::UniqueKeys { scope, .. }
            | MetaRequest::ImportedKeys { scope, .. }
            | MetaRequest::ExportedKeys { scope, .. }
            | MetaRequest::IndexInfo { scope, .. }
            | MetaRequest::Triggers { scope }
            | MetaRequest::TableTriggers { scope, .. } => Some(scope),
            MetaRequest::TableTypes
            | MetaRequest::Catalogs
            | MetaRequest::Schemas { .. }
            | MetaRequest::AllSchemas => None,
        }
    }

    /// Table the request is narrowed to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            MetaRequest::Tables { table, .. } | MetaRequest::Columns { table, .. } => {
                table.as_deref()
            }
            MetaRequest::PrimaryKeys { table, .. }
            | MetaRequest::UniqueKeys { table, .. }
            | MetaRequest::ImportedKeys { table, .. }
            | MetaRequest::ExportedKeys { table, .. }
            | MetaRequest::IndexInfo { table, .. }
            | MetaRequest::TableTriggers { table, .. } => Some(table),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetaRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())?;
        if let Some(scope) = self.scope() {
            write!(
                f,
                "({}, {}",
                scope.catalog.as_deref().unwrap_or("-"),
                scope.schema.as_deref().unwrap_or("-")
            )?;
            if let Some(table) = self.table() {
                write!(f, ", {}", table)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
