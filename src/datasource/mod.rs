//! Data source facade.
//!
//! Entry point of the structure graph. [`DataSource::initialize`] decides the
//! vendor topology:
//!
//! 1. Read catalogs. If any exist, or the catalog filter removed some, the
//!    data source is catalog-rooted (even with an empty catalog list).
//! 2. Otherwise read schemas at the root.
//! 3. Otherwise tables hang off a single flat container.
//!
//! Catalog and schema listing failures are treated as "not supported" and
//! fall through to the next shape. A cancelled listing decides nothing.
//!
//! # Example
//!
//! ```ignore
//! use genmeta::prelude::*;
//!
//! let ds = DataSource::new(DataSourceConfig::new("shop"), provider, Arc::new(GenericDialect));
//! ds.initialize(&NullMonitor)?;
//! let orders = ds.find_table(&NullMonitor, None, Some("public"), "orders")?;
//! ```

mod config;
mod topology;

pub use config::DataSourceConfig;
pub use topology::{Child, Topology};

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::cache::{lock, LazySlot, Load};
use crate::config::MetaCase;
use crate::dialect::Dialect;
use crate::error::{MetaError, MetaResult};
use crate::model::{CacheScope, Container, ContainerKind, Table};
use crate::monitor::ProgressMonitor;
use crate::session::{ContextProvider, Purpose, Session};

/// Topology and table types read by `initialize`.
#[derive(Debug)]
struct Structure {
    table_types: Vec<String>,
    topology: Topology,
}

/// A database whose structure is read lazily through driver metadata.
pub struct DataSource {
    config: DataSourceConfig,
    provider: Arc<dyn ContextProvider>,
    dialect: Arc<dyn Dialect>,
    meta_case: MetaCase,
    structure: Mutex<Option<Arc<Structure>>>,
    active_child: LazySlot<Option<Arc<Container>>>,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.config.name)
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl DataSource {
    pub fn new(
        config: DataSourceConfig,
        provider: Arc<dyn ContextProvider>,
        dialect: Arc<dyn Dialect>,
    ) -> Arc<Self> {
        let meta_case = config.params.meta_case();
        Arc::new(Self {
            config,
            provider,
            dialect,
            meta_case,
            structure: Mutex::new(None),
            active_child: LazySlot::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn ContextProvider {
        self.provider.as_ref()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn meta_case(&self) -> MetaCase {
        self.meta_case
    }

    /// Read table types and decide the catalog/schema topology.
    ///
    /// A cancelled catalog or schema listing leaves the data source
    /// uninitialized; call again to decide the topology.
    pub fn initialize(self: &Arc<Self>, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        monitor.begin_task(&format!("Initialize '{}'", self.name()), 3);

        let (table_types, catalogs) = {
            let session =
                Session::open(self.provider(), Purpose::Meta, "Read generic metadata")?;
            let table_types = self.read_table_types(&*session, monitor)?;
            let Load::Complete(catalogs) = self.read_catalogs(&*session, monitor) else {
                debug!("initialization cancelled while reading catalogs");
                return Ok(());
            };
            (table_types, catalogs)
        };

        let topology = if !catalogs.names.is_empty() || catalogs.filtered {
            debug!(
                catalogs = catalogs.names.len(),
                filtered = catalogs.filtered,
                "catalog-rooted topology"
            );
            Topology::Catalogs(
                catalogs
                    .names
                    .iter()
                    .map(|name| Container::catalog(self, name))
                    .collect(),
            )
        } else {
            monitor.sub_task("Extract schemas");
            monitor.worked(1);
            match self.load_schemas(None, monitor)? {
                Some(Load::Partial(_)) => {
                    debug!("initialization cancelled while reading schemas");
                    return Ok(());
                }
                Some(Load::Complete(schemas)) if !schemas.is_empty() => {
                    debug!(schemas = schemas.len(), "schema-rooted topology");
                    Topology::Schemas(schemas)
                }
                _ => {
                    debug!("flat topology");
                    Topology::Flat(Container::flat(self, self.name()))
                }
            }
        };

        info!(
            data_source = %self.name(),
            table_types = table_types.len(),
            topology = topology_label(&topology),
            "data source initialized"
        );
        *lock(&self.structure) = Some(Arc::new(Structure {
            table_types,
            topology,
        }));
        monitor.done();
        Ok(())
    }

    /// Drop every cached object and initialize again.
    pub fn refresh(self: &Arc<Self>, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        let previous = lock(&self.structure).take();
        if let Some(structure) = previous {
            for container in containers_of(&structure.topology) {
                container.refresh();
            }
        }
        self.active_child.invalidate();
        self.initialize(monitor)
    }

    /// Run the driver shutdown hook when one is configured.
    pub fn close(&self) {
        if let Some(suffix) = self.config.params.shutdown_url_param() {
            if let Err(e) = self.provider.shutdown(suffix) {
                debug!(error = %e, "shutdown hook failed");
            }
        }
    }

    fn structure(&self) -> MetaResult<Arc<Structure>> {
        lock(&self.structure)
            .clone()
            .ok_or(MetaError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.structure).is_some()
    }

    pub fn topology(&self) -> MetaResult<Topology> {
        Ok(self.structure()?.topology.clone())
    }

    pub fn table_types(&self) -> MetaResult<Vec<String>> {
        Ok(self.structure()?.table_types.clone())
    }

    /// Catalogs; empty unless the topology is catalog-rooted.
    pub fn catalogs(&self) -> MetaResult<Vec<Arc<Container>>> {
        Ok(match &self.structure()?.topology {
            Topology::Catalogs(catalogs) => catalogs.clone(),
            _ => Vec::new(),
        })
    }

    /// Root schemas; empty unless the topology is schema-rooted.
    pub fn schemas(&self) -> MetaResult<Vec<Arc<Container>>> {
        Ok(match &self.structure()?.topology {
            Topology::Schemas(schemas) => schemas.clone(),
            _ => Vec::new(),
        })
    }

    pub fn catalog(&self, name: &str) -> MetaResult<Option<Arc<Container>>> {
        Ok(self.lookup(&self.catalogs()?, name))
    }

    pub fn schema(&self, name: &str) -> MetaResult<Option<Arc<Container>>> {
        Ok(self.lookup(&self.schemas()?, name))
    }

    /// The container standing for the data source in flat topology.
    pub fn flat_container(&self) -> MetaResult<Option<Arc<Container>>> {
        Ok(match &self.structure()?.topology {
            Topology::Flat(container) => Some(container.clone()),
            _ => None,
        })
    }

    /// Tables directly under the data source (flat topology only).
    pub fn tables(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Arc<Vec<Arc<Table>>>> {
        match self.flat_container()? {
            Some(container) => container.tables(monitor),
            None => Ok(Arc::new(Vec::new())),
        }
    }

    pub fn table(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        match self.flat_container()? {
            Some(container) => self.table_in(&container, monitor, name),
            None => Ok(None),
        }
    }

    /// Name candidates: the name itself, then its case-folded form.
    fn candidates(&self, name: &str) -> Vec<String> {
        let folded = self.meta_case.transform(name);
        if folded == name {
            vec![name.to_string()]
        } else {
            vec![name.to_string(), folded]
        }
    }

    fn lookup(&self, containers: &[Arc<Container>], name: &str) -> Option<Arc<Container>> {
        self.candidates(name).iter().find_map(|candidate| {
            containers
                .iter()
                .find(|c| c.name() == candidate.as_str())
                .cloned()
        })
    }

    fn table_in(
        &self,
        container: &Arc<Container>,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        for candidate in self.candidates(name) {
            if let Some(table) = container.table(monitor, &candidate)? {
                return Ok(Some(table));
            }
        }
        Ok(None)
    }

    /// Locate a table anywhere in the graph.
    ///
    /// An empty catalog or schema counts as absent. Without a catalog, a
    /// single existing catalog is assumed. A named catalog or schema that does
    /// not exist yields `None`.
    pub fn find_table(
        &self,
        monitor: &dyn ProgressMonitor,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
    ) -> MetaResult<Option<Arc<Table>>> {
        let catalog = catalog.filter(|c| !c.is_empty());
        let schema = schema.filter(|s| !s.is_empty());

        let mut container = None;
        if let Some(catalog_name) = catalog {
            match self.catalog(catalog_name)? {
                Some(found) => container = Some(found),
                None => {
                    error!(catalog = %catalog_name, "catalog not found");
                    return Ok(None);
                }
            }
        } else {
            let catalogs = self.catalogs()?;
            if catalogs.len() == 1 {
                container = Some(catalogs[0].clone());
            }
        }

        if let Some(schema_name) = schema {
            let found = match &container {
                Some(catalog) => {
                    let schemas = catalog.schemas(monitor)?;
                    self.lookup(&schemas, schema_name)
                }
                None => self.schema(schema_name)?,
            };
            match found {
                Some(found) => container = Some(found),
                None => {
                    error!(schema = %schema_name, "schema not found");
                    return Ok(None);
                }
            }
        }

        let container = match container {
            Some(container) => container,
            None => match self.flat_container()? {
                Some(flat) => flat,
                None => return Ok(None),
            },
        };
        self.table_in(&container, monitor, name)
    }

    /// Catalog or root schema by name.
    pub fn find_container(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> MetaResult<Option<Arc<Container>>> {
        if let Some(catalog) = self.catalog(name)? {
            return Ok(Some(catalog));
        }
        if let Some(schema) = self.schema(name)? {
            return Ok(Some(schema));
        }
        for catalog in self.catalogs()? {
            if let Some(schema) = self.lookup(&catalog.schemas(monitor)?, name) {
                return Ok(Some(schema));
            }
        }
        Ok(None)
    }

    /// Catalogs, else root schemas, else the flat container's tables.
    pub fn children(&self, monitor: &dyn ProgressMonitor) -> MetaResult<Vec<Child>> {
        let structure = self.structure()?;
        Ok(match &structure.topology {
            Topology::Catalogs(containers) | Topology::Schemas(containers) => {
                containers.iter().cloned().map(Child::Container).collect()
            }
            Topology::Flat(flat) => flat
                .tables(monitor)?
                .iter()
                .cloned()
                .map(Child::Table)
                .collect(),
        })
    }

    pub fn child(&self, monitor: &dyn ProgressMonitor, name: &str) -> MetaResult<Option<Child>> {
        let structure = self.structure()?;
        Ok(match &structure.topology {
            Topology::Catalogs(containers) | Topology::Schemas(containers) => {
                self.lookup(containers, name).map(Child::Container)
            }
            Topology::Flat(flat) => self.table_in(flat, monitor, name)?.map(Child::Table),
        })
    }

    /// Pre-warm the selected caches of every table.
    pub fn cache_structure(
        &self,
        monitor: &dyn ProgressMonitor,
        scope: CacheScope,
    ) -> MetaResult<()> {
        let structure = self.structure()?;
        for container in containers_of(&structure.topology) {
            if monitor.is_canceled() {
                break;
            }
            container.cache_structure(monitor, scope)?;
        }
        Ok(())
    }

    /// The catalog or schema the session currently points at.
    ///
    /// Read once and remembered until refresh. Probe failures yield `None`.
    pub fn active_child(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<Arc<Container>>> {
        self.active_child.get_or_load(|| {
            // Only tables, no catalogs or schemas: nothing can be active
            if containers_of(&self.structure()?.topology)
                .iter()
                .all(|c| c.kind() == ContainerKind::DataSource)
            {
                return Ok(Load::Complete(None));
            }

            let query = self.config.params.query_get_active_db();
            let active_name = {
                let session =
                    Session::open(self.provider(), Purpose::Meta, "Check active catalog")?;
                let probe = match query {
                    Some(sql) => session.query_string(sql),
                    None => session.current_catalog(),
                };
                match probe {
                    Ok(name) => name,
                    Err(e) => {
                        if query.is_some() {
                            error!(error = %e, "active catalog query failed");
                        } else {
                            debug!(error = %e, "current catalog not available");
                        }
                        return Ok(Load::Complete(None));
                    }
                }
            };

            let Some(active_name) = active_name else {
                return Ok(Load::Complete(None));
            };
            let active = self
                .child(monitor, &active_name)?
                .and_then(|child| child.as_container().cloned());
            if active.is_none() && query.is_some() {
                warn!(name = %active_name, "could not detect currently active database");
            }
            Ok(Load::Complete(active))
        })
    }

    pub fn supports_active_child_change(&self) -> bool {
        self.config.params.query_set_active_db().is_some()
    }

    /// Switch the session's active catalog or schema.
    ///
    /// Fails with a capability error, before touching anything, when no
    /// switch statement is configured or `child` is not a direct child.
    pub fn set_active_child(
        self: &Arc<Self>,
        monitor: &dyn ProgressMonitor,
        child: &Arc<Container>,
    ) -> MetaResult<()> {
        if let Some(Some(current)) = self.active_child.get() {
            if Arc::ptr_eq(&current, child) {
                return Ok(());
            }
        }
        let Some(query) = self.config.params.query_set_active_db() else {
            return Err(MetaError::capability(
                "active database can't be changed for this kind of data source",
            ));
        };
        let is_child = self
            .children(monitor)?
            .iter()
            .any(|c| c.as_container().is_some_and(|c| Arc::ptr_eq(c, child)));
        if !is_child {
            return Err(MetaError::capability(format!(
                "bad child object specified as active: {}",
                child.name()
            )));
        }

        let statement = query.replacen('?', child.name(), 1);
        {
            let session = Session::open(self.provider(), Purpose::Meta, "Set active catalog")?;
            session.execute(&statement)?;
        }
        info!(child = %child.name(), "active child changed");
        self.active_child.set(Some(child.clone()));
        Ok(())
    }
}

fn containers_of(topology: &Topology) -> Vec<Arc<Container>> {
    match topology {
        Topology::Catalogs(containers) | Topology::Schemas(containers) => containers.clone(),
        Topology::Flat(container) => vec![container.clone()],
    }
}

fn topology_label(topology: &Topology) -> &'static str {
    match topology {
        Topology::Catalogs(_) => "catalogs",
        Topology::Schemas(_) => "schemas",
        Topology::Flat(_) => "flat",
    }
}
