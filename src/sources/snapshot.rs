//! JSON snapshot metadata source.
//!
//! A snapshot is a captured set of raw metadata rows, one array per request
//! kind, replayed as if a driver had returned them. It lets a data source be
//! browsed offline and is the fixture format of the test suite.
//!
//! ```json
//! {
//!   "current_catalog": "shop",
//!   "queries": { "SELECT DATABASE()": "shop" },
//!   "catalogs": [ { "TABLE_CAT": "shop" } ],
//!   "tables": [ { "TABLE_CAT": "shop", "TABLE_NAME": "orders", "TABLE_TYPE": "TABLE" } ],
//!   "foreign_keys": [ { "PKTABLE_NAME": "customers", "FKTABLE_NAME": "orders", ... } ]
//! }
//! ```
//!
//! Requests filter rows by catalog, schema and table: a narrowing part set
//! on the request must equal the row's field. Imported and exported keys
//! share one `foreign_keys` array, filtered by the FK and PK side
//! respectively.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::lock;
use crate::cursor::{names, row_stream, DatabaseMetaData, MetaRequest, MetaRow, RowStream, Scope};
use crate::error::{MetaError, MetaResult};
use crate::filter::matches_like;
use crate::session::{ContextProvider, ExecutionContext, Purpose};

/// Raw metadata rows of a captured data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Reported by the session's current-catalog probe
    pub current_catalog: Option<String>,
    /// Canned answers of utility queries, by exact SQL text
    pub queries: BTreeMap<String, Option<String>>,
    /// Request kinds (`MetaRequest::kind`) that fail as unsupported
    pub unsupported: Vec<String>,
    pub table_types: Vec<MetaRow>,
    pub catalogs: Vec<MetaRow>,
    pub schemas: Vec<MetaRow>,
    pub tables: Vec<MetaRow>,
    pub columns: Vec<MetaRow>,
    pub primary_keys: Vec<MetaRow>,
    pub unique_keys: Vec<MetaRow>,
    pub foreign_keys: Vec<MetaRow>,
    pub index_info: Vec<MetaRow>,
    pub triggers: Vec<MetaRow>,
}

impl Snapshot {
    /// Parse a snapshot document.
    pub fn from_json(json: &str) -> MetaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Answer a describe request from the captured rows.
    pub fn describe(&self, request: &MetaRequest) -> MetaResult<Vec<MetaRow>> {
        if self.unsupported.iter().any(|kind| kind == request.kind()) {
            return Err(MetaError::Unsupported(request.to_string()));
        }

        let rows = match request {
            MetaRequest::TableTypes => self.table_types.clone(),
            MetaRequest::Catalogs => self.catalogs.clone(),
            MetaRequest::Schemas { catalog, pattern } => self
                .schemas
                .iter()
                .filter(|row| {
                    let reported = row.safe_get_string(names::TABLE_CATALOG);
                    catalog
                        .as_deref()
                        .map_or(true, |c| reported.is_empty() || reported == c)
                })
                .filter(|row| {
                    pattern.as_deref().map_or(true, |p| {
                        matches_like(&row.safe_get_string(names::TABLE_SCHEM), p)
                    })
                })
                .cloned()
                .collect(),
            MetaRequest::AllSchemas => self.schemas.clone(),
            MetaRequest::Tables { scope, table } | MetaRequest::Columns { scope, table } => {
                let rows = if matches!(request, MetaRequest::Tables { .. }) {
                    &self.tables
                } else {
                    &self.columns
                };
                select(rows, scope, table.as_deref(), TABLE_LABELS)
            }
            MetaRequest::PrimaryKeys { scope, table } => {
                select(&self.primary_keys, scope, Some(table.as_str()), TABLE_LABELS)
            }
            MetaRequest::UniqueKeys { scope, table } => {
                select(&self.unique_keys, scope, Some(table.as_str()), TABLE_LABELS)
            }
            MetaRequest::ImportedKeys { scope, table } => {
                select(&self.foreign_keys, scope, Some(table.as_str()), FK_LABELS)
            }
            MetaRequest::ExportedKeys { scope, table } => {
                select(&self.foreign_keys, scope, Some(table.as_str()), PK_LABELS)
            }
            MetaRequest::IndexInfo {
                scope,
                table,
                unique_only,
                ..
            } => select(&self.index_info, scope, Some(table.as_str()), TABLE_LABELS)
                .into_iter()
                .filter(|row| !unique_only || !row.safe_get_boolean(names::NON_UNIQUE))
                .collect(),
            MetaRequest::Triggers { scope } => select(&self.triggers, scope, None, TRIGGER_LABELS),
            MetaRequest::TableTriggers { scope, table } => {
                select(&self.triggers, scope, Some(table.as_str()), TRIGGER_LABELS)
            }
        };
        Ok(rows)
    }
}

/// Catalog, schema and table labels a request is matched against.
type Labels = (&'static str, &'static str, &'static str);

const TABLE_LABELS: Labels = (names::TABLE_CAT, names::TABLE_SCHEM, names::TABLE_NAME);
const FK_LABELS: Labels = (names::FKTABLE_CAT, names::FKTABLE_SCHEM, names::FKTABLE_NAME);
const PK_LABELS: Labels = (names::PKTABLE_CAT, names::PKTABLE_SCHEM, names::PKTABLE_NAME);
const TRIGGER_LABELS: Labels = (names::TABLE_CAT, names::TABLE_SCHEM, names::EVENT_OBJECT_TABLE);

fn select(rows: &[MetaRow], scope: &Scope, table: Option<&str>, labels: Labels) -> Vec<MetaRow> {
    let (catalog_label, schema_label, table_label) = labels;
    let narrows = |label: &str, wanted: Option<&str>, row: &MetaRow| {
        wanted.map_or(true, |w| row.safe_get_string(label) == w)
    };
    rows.iter()
        .filter(|row| {
            narrows(catalog_label, scope.catalog.as_deref(), row)
                && narrows(schema_label, scope.schema.as_deref(), row)
                && narrows(table_label, table, row)
        })
        .cloned()
        .collect()
}

/// A snapshot served as a context provider.
///
/// Keeps a log of executed statements and can be told to fail every
/// describe call.
#[derive(Debug, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    executed: Mutex<Vec<String>>,
    failing: Mutex<Option<String>>,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }

    /// Load a snapshot file.
    pub fn open<P: AsRef<Path>>(path: P) -> MetaResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(Self::new(Snapshot::from_json(&json)?))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Statements run through `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }

    /// Make every later describe call fail with a data access error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failing) = Some(message.into());
    }

    pub fn recover(&self) {
        *lock(&self.failing) = None;
    }
}

impl ContextProvider for SnapshotSource {
    fn open_context(
        &self,
        purpose: Purpose,
        description: &str,
    ) -> MetaResult<Box<dyn ExecutionContext + '_>> {
        debug!(?purpose, description, "snapshot context");
        Ok(Box::new(SnapshotContext { source: self }))
    }
}

struct SnapshotContext<'a> {
    source: &'a SnapshotSource,
}

impl ExecutionContext for SnapshotContext<'_> {
    fn metadata(&self) -> &dyn DatabaseMetaData {
        self
    }

    fn current_catalog(&self) -> MetaResult<Option<String>> {
        Ok(self.source.snapshot.current_catalog.clone())
    }

    fn query_string(&self, sql: &str) -> MetaResult<Option<String>> {
        self.source
            .snapshot
            .queries
            .get(sql)
            .cloned()
            .ok_or_else(|| MetaError::data_access(format!("no recorded answer for '{}'", sql)))
    }

    fn execute(&self, sql: &str) -> MetaResult<()> {
        lock(&self.source.executed).push(sql.to_string());
        Ok(())
    }
}

impl DatabaseMetaData for SnapshotContext<'_> {
    fn describe(&self, request: &MetaRequest) -> MetaResult<RowStream<'_>> {
        if let Some(message) = lock(&self.source.failing).clone() {
            return Err(MetaError::data_access(message));
        }
        Ok(row_stream(self.source.snapshot.describe(request)?))
    }
}
