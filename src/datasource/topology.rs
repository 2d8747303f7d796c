//! Catalog/schema discovery.

use std::sync::Arc;

use tracing::{debug, warn};

use super::DataSource;
use crate::cache::Load;
use crate::cursor::{names, MetaRequest, RowStream};
use crate::error::MetaResult;
use crate::filter::matches_any_like;
use crate::model::{Container, Table};
use crate::monitor::ProgressMonitor;
use crate::session::{ExecutionContext, Purpose, Session};

/// How the vendor organises tables.
///
/// Exactly one shape holds for an initialized data source.
#[derive(Debug, Clone)]
pub enum Topology {
    /// Catalog-rooted; possibly empty when a filter removed every catalog
    Catalogs(Vec<Arc<Container>>),
    /// Schemas at the root, no catalogs
    Schemas(Vec<Arc<Container>>),
    /// Neither; tables hang off the data source itself
    Flat(Arc<Container>),
}

impl Topology {
    pub fn is_flat(&self) -> bool {
        matches!(self, Topology::Flat(_))
    }
}

/// A direct child of the data source.
#[derive(Debug, Clone)]
pub enum Child {
    Container(Arc<Container>),
    Table(Arc<Table>),
}

impl Child {
    pub fn name(&self) -> &str {
        match self {
            Child::Container(c) => c.name(),
            Child::Table(t) => t.name(),
        }
    }

    pub fn as_container(&self) -> Option<&Arc<Container>> {
        match self {
            Child::Container(c) => Some(c),
            Child::Table(_) => None,
        }
    }
}

/// Catalog names that passed the filter, and whether the filter dropped any.
pub(super) struct CatalogListing {
    pub names: Vec<String>,
    pub filtered: bool,
}

impl DataSource {
    /// Distinct, non-empty table types in reported order.
    pub(super) fn read_table_types(
        &self,
        session: &dyn ExecutionContext,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Vec<String>> {
        monitor.sub_task("Extract table types");
        monitor.worked(1);
        let mut types: Vec<String> = Vec::new();
        for row in session.metadata().describe(&MetaRequest::TableTypes)? {
            let table_type = row?.safe_get_string(names::TABLE_TYPE);
            if !table_type.is_empty() && !types.contains(&table_type) {
                types.push(table_type);
            }
        }
        Ok(types)
    }

    /// Read catalog names. Failures mean "no catalogs" and are not reported.
    pub(super) fn read_catalogs(
        &self,
        session: &dyn ExecutionContext,
        monitor: &dyn ProgressMonitor,
    ) -> Load<CatalogListing> {
        monitor.sub_task("Extract catalogs");
        monitor.worked(1);
        let mut listing = CatalogListing {
            names: Vec::new(),
            filtered: false,
        };
        let rows = match session.metadata().describe(&MetaRequest::Catalogs) {
            Ok(rows) => rows,
            Err(e) => {
                debug!(error = %e, "catalogs not available");
                return Load::Complete(listing);
            }
        };

        let filters = &self.config().catalog_filter;
        let mut canceled = false;
        for row in rows {
            if monitor.is_canceled() {
                canceled = true;
                break;
            }
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!(error = %e, "catalog listing aborted");
                    break;
                }
            };
            let mut name = row.safe_get_string(names::TABLE_CAT);
            if name.is_empty() {
                // Some drivers report TABLE_QUALIFIER instead
                name = row.safe_get_string(names::TABLE_QUALIFIER);
            }
            if filters.is_empty() || matches_any_like(&name, filters) {
                monitor.sub_task(&format!("Extract catalogs - {}", name));
                listing.names.push(name);
            } else {
                listing.filtered = true;
            }
        }
        Load::new(listing, canceled || monitor.is_canceled())
    }

    /// List schemas at the root (`catalog = None`) or inside a catalog.
    ///
    /// Returns `None` when the source cannot list schemas at all, and
    /// [`Load::Partial`] when the listing was cancelled.
    pub(crate) fn load_schemas(
        self: &Arc<Self>,
        catalog: Option<&Arc<Container>>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<Load<Vec<Arc<Container>>>>> {
        let session = Session::open(self.provider(), Purpose::Meta, "Load schemas")?;
        let filters = &self.config().schema_filter;
        let request = MetaRequest::Schemas {
            catalog: catalog.map(|c| c.name().to_string()),
            pattern: (filters.len() == 1).then(|| filters[0].clone()),
        };

        let (rows, catalog_schemas): (RowStream<'_>, bool) =
            match session.metadata().describe(&request) {
                Ok(rows) => (rows, true),
                Err(e) => {
                    debug!(error = %e, "per-catalog schema listing failed, reading all schemas");
                    match session.metadata().describe(&MetaRequest::AllSchemas) {
                        Ok(rows) => (rows, false),
                        Err(e) => {
                            warn!(error = %e, "could not read schema list");
                            return Ok(None);
                        }
                    }
                }
            };

        let mut schemas = Vec::new();
        let mut canceled = false;
        for row in rows {
            if monitor.is_canceled() {
                canceled = true;
                break;
            }
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "could not read schema list");
                    return Ok(None);
                }
            };
            let mut name = row.safe_get_string(names::TABLE_SCHEM);
            if name.is_empty() {
                // Some drivers report TABLE_OWNER instead
                name = row.safe_get_string(names::TABLE_OWNER);
            }
            if name.is_empty() {
                continue;
            }
            if !filters.is_empty() && !matches_any_like(&name, filters) {
                continue;
            }

            let reported_catalog = row.safe_get_string(names::TABLE_CATALOG);
            if !reported_catalog.is_empty() {
                match catalog {
                    None => warn!(
                        catalog = %reported_catalog,
                        schema = %name,
                        "catalog name found for schema without parent catalog"
                    ),
                    Some(parent) if parent.name() != reported_catalog => {
                        if !catalog_schemas {
                            // Full listing: the schema belongs to another catalog
                            continue;
                        }
                        warn!(
                            catalog = %reported_catalog,
                            expected = %parent.name(),
                            schema = %name,
                            "schema catalog differs from parent catalog"
                        );
                    }
                    Some(_) => {}
                }
            }

            monitor.sub_task(&format!("Schema {}", name));
            schemas.push(Container::schema(self, catalog, &name));
        }
        Ok(Some(Load::new(schemas, canceled || monitor.is_canceled())))
    }
}
