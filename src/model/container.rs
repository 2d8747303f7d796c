// src/model/container.rs
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::cache::{LazyList, LazySlot, Load};
use crate::cursor::{names, MetaRequest, Scope};
use crate::datasource::DataSource;
use crate::error::{MetaError, MetaResult};
use crate::model::{Column, ColumnLoadScope, Table, Trigger};
use crate::monitor::ProgressMonitor;
use crate::session::{Purpose, Session};

/// What a container stands for in the vendor topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Catalog,
    Schema,
    /// The data source itself, when the vendor has neither catalogs nor schemas
    DataSource,
}

/// Which lazy caches [`Container::cache_structure`] pre-warms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheScope {
    pub columns: bool,
    pub indexes: bool,
    pub keys: bool,
}

impl CacheScope {
    pub const COLUMNS: CacheScope = CacheScope {
        columns: true,
        indexes: false,
        keys: false,
    };

    pub const ALL: CacheScope = CacheScope {
        columns: true,
        indexes: true,
        keys: true,
    };
}

/// Result of a container-wide columns scan, one entry per table.
pub type ColumnBatch = Vec<(Arc<Table>, Arc<Vec<Arc<Column>>>)>;

/// A catalog, a schema, or the bare data source holding tables.
#[derive(Debug)]
pub struct Container {
    data_source: Weak<DataSource>,
    parent: Weak<Container>,
    kind: ContainerKind,
    name: String,
    scope: Scope,
    schemas: LazyList<Arc<Container>>,
    tables: LazyList<Arc<Table>>,
    triggers: LazyList<Arc<Trigger>>,
}

impl Container {
    fn new(
        data_source: &Arc<DataSource>,
        parent: Weak<Container>,
        kind: ContainerKind,
        name: String,
        scope: Scope,
    ) -> Arc<Self> {
        Arc::new(Self {
            data_source: Arc::downgrade(data_source),
            parent,
            kind,
            name,
            scope,
            schemas: LazySlot::new(),
            tables: LazySlot::new(),
            triggers: LazySlot::new(),
        })
    }

    pub fn catalog(data_source: &Arc<DataSource>, name: &str) -> Arc<Self> {
        Self::new(
            data_source,
            Weak::new(),
            ContainerKind::Catalog,
            name.to_string(),
            Scope::catalog(name),
        )
    }

    /// A schema, either at the root or inside a catalog.
    pub fn schema(
        data_source: &Arc<DataSource>,
        catalog: Option<&Arc<Container>>,
        name: &str,
    ) -> Arc<Self> {
        let scope = Scope::new(
            catalog.map(|c| c.name.clone()),
            Some(name.to_string()),
        );
        Self::new(
            data_source,
            catalog.map(Arc::downgrade).unwrap_or_default(),
            ContainerKind::Schema,
            name.to_string(),
            scope,
        )
    }

    /// The data source standing in for a container.
    pub fn flat(data_source: &Arc<DataSource>, name: &str) -> Arc<Self> {
        Self::new(
            data_source,
            Weak::new(),
            ContainerKind::DataSource,
            name.to_string(),
            Scope::root(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Catalog owning this schema, if any.
    pub fn parent(&self) -> Option<Arc<Container>> {
        self.parent.upgrade()
    }

    pub fn data_source(&self) -> MetaResult<Arc<DataSource>> {
        self.data_source.upgrade().ok_or(MetaError::NotInitialized)
    }

    /// Schemas of a catalog; empty for other kinds.
    pub fn schemas(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Container>>>> {
        if self.kind != ContainerKind::Catalog {
            return Ok(Arc::new(Vec::new()));
        }
        self.schemas.get_or_load(|| {
            let data_source = self.data_source()?;
            Ok(match data_source.load_schemas(Some(self), monitor)? {
                Some(schemas) => schemas.map(Arc::new),
                None => Load::Complete(Arc::new(Vec::new())),
            })
        })
    }

    pub fn schema_named(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Container>>> {
        Ok(self.schemas(monitor)?.iter().find(|s| s.name == name).cloned())
    }

    /// Tables directly in this container.
    ///
    /// A catalog that has schemas keeps its tables under them and lists none
    /// itself.
    pub fn tables(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Table>>>> {
        self.tables.get_or_load(|| {
            if !self.schemas(monitor)?.is_empty() {
                return Ok(Load::Complete(Arc::new(Vec::new())));
            }
            let data_source = self.data_source()?;
            let session = Session::open(
                data_source.provider(),
                Purpose::Meta,
                &format!("Load tables of '{}'", self.name),
            )?;
            let request = MetaRequest::Tables {
                scope: self.scope.clone(),
                table: None,
            };
            debug!(%request, "loading tables");

            let dialect = data_source.dialect();
            let mut tables = Vec::new();
            let mut canceled = false;
            for row in session.metadata().describe(&request)? {
                if monitor.is_canceled() {
                    canceled = true;
                    break;
                }
                let descriptor = dialect.table_descriptor(&row?);
                if descriptor.name.is_empty() {
                    continue;
                }
                tables.push(Table::new(self, descriptor));
            }
            // Also covers a cancelled schema listing above
            let canceled = canceled || monitor.is_canceled();
            Ok(Load::new(Arc::new(tables), canceled))
        })
    }

    /// Table by exact name.
    pub fn table(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        Ok(self.tables(monitor)?.iter().find(|t| t.name() == name).cloned())
    }

    /// Scan the columns of every table in one request and hand each table
    /// its share. Tables without rows get an empty list.
    ///
    /// A complete scan is stored into each table's column cache (tables that
    /// already loaded keep their columns). A cancelled scan stores nothing.
    pub fn load_columns(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Load<ColumnBatch>> {
        let tables = self.tables(monitor)?;
        let data_source = self.data_source()?;
        let session = Session::open(
            data_source.provider(),
            Purpose::Meta,
            &format!("Load columns of '{}'", self.name),
        )?;
        let request = MetaRequest::Columns {
            scope: self.scope.clone(),
            table: None,
        };
        debug!(%request, tables = tables.len(), "loading container columns");

        let positions: HashMap<&str, usize> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name(), i))
            .collect();
        let mut grouped: Vec<Vec<Arc<Column>>> = vec![Vec::new(); tables.len()];
        let mut canceled = false;
        for row in session.metadata().describe(&request)? {
            if monitor.is_canceled() {
                canceled = true;
                break;
            }
            let row = row?;
            let table_name = row.safe_get_string(names::TABLE_NAME);
            match positions.get(table_name.as_str()) {
                Some(&i) => grouped[i].push(Arc::new(Column::from_row(&tables[i], &row))),
                None => debug!(table = %table_name, "columns for unlisted table ignored"),
            }
        }
        let canceled = canceled || monitor.is_canceled();

        let batch: ColumnBatch = tables
            .iter()
            .zip(grouped)
            .map(|(table, columns)| {
                let columns = Arc::new(columns);
                if canceled {
                    (table.clone(), columns)
                } else {
                    (table.clone(), table.cache_columns(columns))
                }
            })
            .collect();
        Ok(Load::new(batch, canceled))
    }

    /// Triggers owned by this container.
    ///
    /// Sources without trigger metadata yield an empty list.
    pub fn triggers(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Arc<Vec<Arc<Trigger>>>> {
        self.triggers.get_or_load(|| {
            let data_source = self.data_source()?;
            let session = Session::open(
                data_source.provider(),
                Purpose::Meta,
                &format!("Load triggers of '{}'", self.name),
            )?;
            let request = MetaRequest::Triggers {
                scope: self.scope.clone(),
            };
            debug!(%request, "loading triggers");

            let rows = match session.metadata().describe(&request) {
                Ok(rows) => rows,
                Err(MetaError::Unsupported(what)) => {
                    debug!(%what, "trigger metadata not available");
                    return Ok(Load::Complete(Arc::new(Vec::new())));
                }
                Err(e) => return Err(e),
            };

            let mut triggers = Vec::new();
            let mut canceled = false;
            for row in rows {
                if monitor.is_canceled() {
                    canceled = true;
                    break;
                }
                let trigger = Trigger::from_row(self, &row?);
                if !trigger.name.is_empty() {
                    triggers.push(Arc::new(trigger));
                }
            }
            Ok(Load::new(Arc::new(triggers), canceled))
        })
    }

    pub fn trigger(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Trigger>>> {
        Ok(self.triggers(monitor)?.iter().find(|t| t.name == name).cloned())
    }

    /// Eagerly load the caches selected by `scope` for every table below
    /// this container. Stops early when the monitor is cancelled.
    pub fn cache_structure(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        scope: CacheScope,
    ) -> MetaResult<()> {
        for schema in self.schemas(monitor)?.iter() {
            if monitor.is_canceled() {
                return Ok(());
            }
            schema.cache_structure(monitor, scope)?;
        }

        let tables = self.tables(monitor)?;
        monitor.begin_task(&format!("Cache structure of '{}'", self.name), tables.len() as u64);
        if scope.columns && tables.iter().any(|t| !t.columns_loaded()) {
            let data_source = self.data_source()?;
            if data_source.config().column_load == ColumnLoadScope::Container {
                self.load_columns(monitor)?;
            }
        }
        for table in tables.iter() {
            if monitor.is_canceled() {
                break;
            }
            monitor.sub_task(table.name());
            if scope.columns {
                table.columns(monitor)?;
            }
            if scope.indexes {
                table.indexes(monitor)?;
            }
            if scope.keys {
                table.constraints(monitor)?;
                table.foreign_keys(monitor)?;
            }
            monitor.worked(1);
        }
        monitor.done();
        Ok(())
    }

    /// Forget every cached child list of this container.
    pub fn refresh(&self) {
        self.schemas.invalidate();
        self.tables.invalidate();
        self.triggers.invalidate();
    }
}
