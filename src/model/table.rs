// src/model/table.rs
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::cache::{LazyList, LazySlot, Load};
use crate::cursor::{names, MetaRequest, MetaRow, Scope};
use crate::datasource::DataSource;
use crate::dialect::Dialect;
use crate::error::{MetaError, MetaResult};
use crate::model::kinds::classify_table_type;
use crate::model::{
    full_table_name, Column, ColumnLoadScope, Constraint, ConstraintKind, Container, ForeignKey,
    Index, Trigger,
};
use crate::monitor::ProgressMonitor;
use crate::resolver::{self, KeyDirection};
use crate::session::{Purpose, Session};

/// Type reference of a typed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
}

/// Immutable description of a table, built once from a tables-scan row.
#[derive(Debug, Clone, Default)]
pub struct TableDescriptor {
    pub name: String,
    /// Vendor table type string, as reported
    pub table_type: String,
    pub description: Option<String>,
    pub type_info: Option<TypeInfo>,
    /// Storage engine (MySQL)
    pub engine: Option<String>,
    /// Row count reported with the table listing, if any
    pub row_count: Option<i64>,
    pub auto_increment: Option<i64>,
    is_view: bool,
    is_system: bool,
}

impl TableDescriptor {
    /// Create a descriptor; view/system flags are derived from `table_type` here
    /// and never recomputed.
    pub fn new(name: impl Into<String>, table_type: impl Into<String>) -> Self {
        let table_type = table_type.into();
        let (is_view, is_system) = classify_table_type(&table_type);
        Self {
            name: name.into(),
            table_type,
            is_view,
            is_system,
            ..Default::default()
        }
    }

    /// Generic descriptor from standard tables-scan labels.
    pub fn from_row(row: &MetaRow) -> Self {
        let type_info = row.get_non_empty(names::TYPE_NAME).map(|name| TypeInfo {
            catalog: row.get_non_empty(names::TYPE_CAT),
            schema: row.get_non_empty(names::TYPE_SCHEM),
            name,
        });

        Self {
            description: row.get_non_empty(names::REMARKS),
            type_info,
            ..Self::new(
                row.safe_get_string(names::TABLE_NAME),
                row.safe_get_string(names::TABLE_TYPE),
            )
        }
    }

    pub fn is_view(&self) -> bool {
        self.is_view
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }
}

/// A table or view.
///
/// Columns, indexes, constraints, foreign keys and triggers are each loaded
/// on first access and cached until [`Table::refresh`].
#[derive(Debug)]
pub struct Table {
    container: Weak<Container>,
    descriptor: TableDescriptor,
    columns: LazyList<Arc<Column>>,
    indexes: LazyList<Arc<Index>>,
    constraints: LazyList<Arc<Constraint>>,
    foreign_keys: LazyList<Arc<ForeignKey>>,
    triggers: LazyList<Arc<Trigger>>,
    row_count: LazySlot<i64>,
}

impl Table {
    pub fn new(container: &Arc<Container>, descriptor: TableDescriptor) -> Arc<Self> {
        Arc::new(Self {
            container: Arc::downgrade(container),
            descriptor,
            columns: LazySlot::new(),
            indexes: LazySlot::new(),
            constraints: LazySlot::new(),
            foreign_keys: LazySlot::new(),
            triggers: LazySlot::new(),
            row_count: LazySlot::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn is_view(&self) -> bool {
        self.descriptor.is_view()
    }

    pub fn is_system(&self) -> bool {
        self.descriptor.is_system()
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn container(&self) -> Option<Arc<Container>> {
        self.container.upgrade()
    }

    pub(crate) fn owner(&self) -> MetaResult<Arc<Container>> {
        self.container().ok_or(MetaError::NotInitialized)
    }

    pub fn data_source(&self) -> MetaResult<Arc<DataSource>> {
        self.owner()?.data_source()
    }

    /// Catalog/schema scope of this table's requests.
    pub fn scope(&self) -> Scope {
        self.container()
            .map(|c| c.scope().clone())
            .unwrap_or_default()
    }

    pub fn catalog_name(&self) -> Option<String> {
        self.scope().catalog
    }

    pub fn schema_name(&self) -> Option<String> {
        self.scope().schema
    }

    /// `catalog.schema.table` with absent parts left out.
    pub fn full_name(&self) -> String {
        let scope = self.scope();
        full_table_name(
            scope.catalog.as_deref(),
            scope.schema.as_deref(),
            self.name(),
        )
    }

    /// Qualified name with every part quoted by `dialect`.
    pub fn quoted_name(&self, dialect: &dyn Dialect) -> String {
        let scope = self.scope();
        [scope.catalog.as_deref(), scope.schema.as_deref(), Some(self.name())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .map(|part| dialect.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn columns(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Column>>>> {
        self.columns.get_or_load(|| {
            let data_source = self.data_source()?;
            match data_source.config().column_load {
                ColumnLoadScope::Table => self.load_columns(&data_source, monitor),
                ColumnLoadScope::Container => {
                    let owner = self.owner()?;
                    let batch = owner.load_columns(monitor)?;
                    let complete = batch.is_complete();
                    let found = batch
                        .into_inner()
                        .into_iter()
                        .find(|(table, _)| Arc::ptr_eq(table, self));
                    match found {
                        Some((_, columns)) => Ok(Load::new(columns, !complete)),
                        // Table is no longer part of its container's listing
                        None => self.load_columns(&data_source, monitor),
                    }
                }
            }
        })
    }

    fn load_columns(
        self: &Arc<Self>,
        data_source: &DataSource,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Load<Arc<Vec<Arc<Column>>>>> {
        let session = Session::open(
            data_source.provider(),
            Purpose::Meta,
            &format!("Load table '{}' columns", self.name()),
        )?;
        let request = MetaRequest::Columns {
            scope: self.scope(),
            table: Some(self.name().to_string()),
        };
        debug!(%request, "loading columns");

        let mut columns = Vec::new();
        let mut canceled = false;
        for row in session.metadata().describe(&request)? {
            if monitor.is_canceled() {
                canceled = true;
                break;
            }
            let row = row?;
            // The table name is a LIKE pattern and may match neighbours
            if row.has(names::TABLE_NAME) && row.safe_get_string(names::TABLE_NAME) != self.name() {
                continue;
            }
            columns.push(Arc::new(Column::from_row(self, &row)));
        }
        Ok(Load::new(Arc::new(columns), canceled))
    }

    /// Store a container-wide column load result unless already cached.
    pub(crate) fn cache_columns(&self, columns: Arc<Vec<Arc<Column>>>) -> Arc<Vec<Arc<Column>>> {
        self.columns.set_if_absent(columns)
    }

    /// Column by exact name.
    pub fn column(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Column>>> {
        Ok(self.columns(monitor)?.iter().find(|c| c.name == name).cloned())
    }

    pub fn indexes(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Index>>>> {
        self.indexes
            .get_or_load(|| resolver::load_indexes(self, monitor).map(|load| load.map(Arc::new)))
    }

    pub fn index(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Index>>> {
        Ok(self.indexes(monitor)?.iter().find(|i| i.name == name).cloned())
    }

    /// Primary and unique keys.
    pub fn constraints(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Constraint>>>> {
        self.constraints.get_or_load(|| {
            resolver::load_unique_keys(self, monitor).map(|load| load.map(Arc::new))
        })
    }

    pub fn constraint(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Constraint>>> {
        Ok(self
            .constraints(monitor)?
            .iter()
            .find(|c| c.name_matches(name))
            .cloned())
    }

    pub fn primary_key(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<Arc<Constraint>>> {
        Ok(self
            .constraints(monitor)?
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
            .cloned())
    }

    /// Foreign keys defined on this table.
    pub fn foreign_keys(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<ForeignKey>>>> {
        self.foreign_keys.get_or_load(|| {
            resolver::load_foreign_keys(self, KeyDirection::Imported, monitor)
                .map(|load| load.map(Arc::new))
        })
    }

    pub fn foreign_key(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<ForeignKey>>> {
        Ok(self
            .foreign_keys(monitor)?
            .iter()
            .find(|fk| fk.name_matches(Some(name)))
            .cloned())
    }

    /// Foreign keys of other tables that reference this one.
    ///
    /// Not cached; every call scans the exported keys again.
    pub fn references(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<Arc<ForeignKey>>> {
        Ok(resolver::load_foreign_keys(self, KeyDirection::Exported, monitor)?.into_inner())
    }

    pub fn triggers(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Trigger>>>> {
        self.triggers.get_or_load(|| {
            let data_source = self.data_source()?;
            data_source
                .dialect()
                .load_table_triggers(self, monitor)
                .map(|load| load.map(Arc::new))
        })
    }

    /// Row count: the value reported with the listing, otherwise counted once.
    pub fn row_count(self: &Arc<Self>, monitor: &dyn ProgressMonitor) -> MetaResult<i64> {
        if let Some(count) = self.descriptor.row_count {
            return Ok(count);
        }
        self.row_count.get_or_load(|| {
            monitor.sub_task(&format!("Count rows of {}", self.full_name()));
            let data_source = self.data_source()?;
            let session = Session::open(
                data_source.provider(),
                Purpose::Utility,
                &format!("Read table '{}' row count", self.name()),
            )?;
            let sql = format!(
                "SELECT COUNT(*) FROM {}",
                self.quoted_name(data_source.dialect())
            );
            let answer = session.query_string(&sql)?;
            let count = answer
                .as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    MetaError::data_access(format!(
                        "bad row count for {}: {:?}",
                        self.full_name(),
                        answer
                    ))
                })?;
            Ok(Load::Complete(count))
        })
    }

    /// Drop every cached collection so the next access reloads it.
    pub fn refresh(&self) {
        self.columns.invalidate();
        self.indexes.invalidate();
        self.constraints.invalidate();
        self.foreign_keys.invalidate();
        self.triggers.invalidate();
        self.row_count.invalidate();
    }

    pub fn columns_loaded(&self) -> bool {
        self.columns.is_loaded()
    }

    pub fn indexes_loaded(&self) -> bool {
        self.indexes.is_loaded()
    }

    pub fn constraints_loaded(&self) -> bool {
        self.constraints.is_loaded()
    }

    pub fn foreign_keys_loaded(&self) -> bool {
        self.foreign_keys.is_loaded()
    }
}
