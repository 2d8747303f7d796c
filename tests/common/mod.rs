//! Shared fixtures: snapshot row builders and an instrumented provider.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use genmeta::cursor::names::{self, deferrability, rule};
use genmeta::cursor::{DatabaseMetaData, MetaRequest, MetaRow, RowStream};
use genmeta::datasource::{DataSource, DataSourceConfig};
use genmeta::dialect::{Dialect, GenericDialect};
use genmeta::monitor::{NullMonitor, ProgressMonitor};
use genmeta::session::{ContextProvider, ExecutionContext, Purpose};
use genmeta::sources::{Snapshot, SnapshotSource};
use genmeta::MetaResult;

// ============================================================================
// Row builders
// ============================================================================

pub fn catalog_row(name: &str) -> MetaRow {
    MetaRow::new().with(names::TABLE_CAT, name)
}

pub fn schema_row(catalog: Option<&str>, name: &str) -> MetaRow {
    MetaRow::new()
        .with(names::TABLE_CATALOG, catalog)
        .with(names::TABLE_SCHEM, name)
}

pub fn table_type_row(name: &str) -> MetaRow {
    MetaRow::new().with(names::TABLE_TYPE, name)
}

pub fn table_row(schema: &str, name: &str, table_type: &str) -> MetaRow {
    MetaRow::new()
        .with(names::TABLE_SCHEM, schema)
        .with(names::TABLE_NAME, name)
        .with(names::TABLE_TYPE, table_type)
}

pub fn column_row(schema: &str, table: &str, name: &str, ordinal: i32) -> MetaRow {
    MetaRow::new()
        .with(names::TABLE_SCHEM, schema)
        .with(names::TABLE_NAME, table)
        .with(names::COLUMN_NAME, name)
        .with(names::ORDINAL_POSITION, ordinal)
        .with(names::DATA_TYPE, 4)
        .with(names::TYPE_NAME, "INTEGER")
        .with(names::NULLABLE, 0)
}

pub fn pk_row(schema: &str, table: &str, pk_name: Option<&str>, column: &str, seq: i32) -> MetaRow {
    MetaRow::new()
        .with(names::TABLE_SCHEM, schema)
        .with(names::TABLE_NAME, table)
        .with(names::PK_NAME, pk_name)
        .with(names::COLUMN_NAME, column)
        .with(names::KEY_SEQ, seq)
}

/// One column pair of a foreign key. `pk` and `fk` are `(schema, table, column)`.
pub fn fk_row(
    pk: (&str, &str, &str),
    fk: (&str, &str, &str),
    fk_name: Option<&str>,
    pk_name: Option<&str>,
    seq: i32,
) -> MetaRow {
    MetaRow::new()
        .with(names::PKTABLE_SCHEM, pk.0)
        .with(names::PKTABLE_NAME, pk.1)
        .with(names::PKCOLUMN_NAME, pk.2)
        .with(names::FKTABLE_SCHEM, fk.0)
        .with(names::FKTABLE_NAME, fk.1)
        .with(names::FKCOLUMN_NAME, fk.2)
        .with(names::FK_NAME, fk_name)
        .with(names::PK_NAME, pk_name)
        .with(names::KEY_SEQ, seq)
        .with(names::UPDATE_RULE, rule::NO_ACTION)
        .with(names::DELETE_RULE, rule::NO_ACTION)
        .with(names::DEFERRABILITY, deferrability::NOT_DEFERRABLE)
}

pub fn index_row(schema: &str, table: &str, index: &str, column: &str, ordinal: i32) -> MetaRow {
    MetaRow::new()
        .with(names::TABLE_SCHEM, schema)
        .with(names::TABLE_NAME, table)
        .with(names::INDEX_NAME, index)
        .with(names::COLUMN_NAME, column)
        .with(names::ORDINAL_POSITION, ordinal)
        .with(names::NON_UNIQUE, true)
        .with(names::TYPE, 3)
}

/// Schema-rooted shop: `sales.customers`, `sales.orders`, `sales.order_lines`.
///
/// Every table has a named primary key; `orders` references `customers`
/// and `order_lines` references `orders`.
pub fn shop_snapshot() -> Snapshot {
    Snapshot {
        table_types: vec![table_type_row("TABLE"), table_type_row("VIEW")],
        schemas: vec![schema_row(None, "sales")],
        tables: vec![
            table_row("sales", "customers", "TABLE"),
            table_row("sales", "orders", "TABLE"),
            table_row("sales", "order_lines", "TABLE"),
        ],
        columns: vec![
            column_row("sales", "customers", "id", 1),
            column_row("sales", "customers", "email", 2),
            column_row("sales", "orders", "id", 1),
            column_row("sales", "orders", "customer_id", 2),
            column_row("sales", "order_lines", "order_id", 1),
            column_row("sales", "order_lines", "line_no", 2),
        ],
        primary_keys: vec![
            pk_row("sales", "customers", Some("pk_customers"), "id", 1),
            pk_row("sales", "orders", Some("pk_orders"), "id", 1),
            pk_row("sales", "order_lines", Some("pk_order_lines"), "order_id", 1),
            pk_row("sales", "order_lines", Some("pk_order_lines"), "line_no", 2),
        ],
        foreign_keys: vec![
            fk_row(
                ("sales", "customers", "id"),
                ("sales", "orders", "customer_id"),
                Some("fk_orders_customer"),
                Some("pk_customers"),
                1,
            )
            .with(names::DELETE_RULE, rule::CASCADE),
            fk_row(
                ("sales", "orders", "id"),
                ("sales", "order_lines", "order_id"),
                Some("fk_lines_order"),
                Some("pk_orders"),
                1,
            )
            .with(names::DELETE_RULE, rule::SET_NULL)
            .with(names::UPDATE_RULE, rule::RESTRICT),
        ],
        index_info: vec![
            index_row("sales", "orders", "idx_orders_customer", "customer_id", 1),
            index_row("sales", "orders", "idx_orders_customer", "id", 2),
        ],
        ..Default::default()
    }
}

// ============================================================================
// Data source construction
// ============================================================================

/// Initialized data source over `snapshot` with the generic dialect.
pub fn data_source(snapshot: Snapshot) -> (Arc<DataSource>, Arc<CountingProvider>) {
    data_source_with(DataSourceConfig::new("shop"), snapshot, Arc::new(GenericDialect))
}

pub fn data_source_with(
    config: DataSourceConfig,
    snapshot: Snapshot,
    dialect: Arc<dyn Dialect>,
) -> (Arc<DataSource>, Arc<CountingProvider>) {
    let provider = Arc::new(CountingProvider::new(Arc::new(SnapshotSource::new(snapshot))));
    let data_source = DataSource::new(config, provider.clone(), dialect);
    data_source
        .initialize(&NullMonitor)
        .expect("initialize data source");
    (data_source, provider)
}

// ============================================================================
// Instrumented provider
// ============================================================================

/// Wraps a provider and counts contexts and describe requests.
///
/// An optional delay is applied to every describe call so concurrent loads
/// overlap.
pub struct CountingProvider {
    inner: Arc<dyn ContextProvider>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    requests: Mutex<HashMap<&'static str, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl CountingProvider {
    pub fn new(inner: Arc<dyn ContextProvider>) -> Self {
        Self {
            inner,
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            requests: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Describe calls issued for a request kind (`MetaRequest::kind`).
    pub fn requests(&self, kind: &str) -> usize {
        self.requests.lock().unwrap().get(kind).copied().unwrap_or(0)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, request: &MetaRequest) {
        *self.requests.lock().unwrap().entry(request.kind()).or_insert(0) += 1;
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }
}

impl ContextProvider for CountingProvider {
    fn open_context(
        &self,
        purpose: Purpose,
        description: &str,
    ) -> MetaResult<Box<dyn ExecutionContext + '_>> {
        let inner = self.inner.open_context(purpose, description)?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingContext { inner, owner: self }))
    }
}

struct CountingContext<'a> {
    inner: Box<dyn ExecutionContext + 'a>,
    owner: &'a CountingProvider,
}

impl ExecutionContext for CountingContext<'_> {
    fn metadata(&self) -> &dyn DatabaseMetaData {
        self
    }

    fn current_catalog(&self) -> MetaResult<Option<String>> {
        self.inner.current_catalog()
    }

    fn query_string(&self, sql: &str) -> MetaResult<Option<String>> {
        self.inner.query_string(sql)
    }

    fn execute(&self, sql: &str) -> MetaResult<()> {
        self.inner.execute(sql)
    }

    fn close(&mut self) {
        self.inner.close();
        self.owner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl DatabaseMetaData for CountingContext<'_> {
    fn describe(&self, request: &MetaRequest) -> MetaResult<RowStream<'_>> {
        self.owner.record(request);
        self.inner.metadata().describe(request)
    }
}

// ============================================================================
// Monitors
// ============================================================================

/// Monitor that reports cancellation after a number of polls.
pub struct CancelAfter {
    remaining: AtomicI64,
}

impl CancelAfter {
    pub fn new(polls: i64) -> Self {
        Self {
            remaining: AtomicI64::new(polls),
        }
    }
}

impl ProgressMonitor for CancelAfter {
    fn is_canceled(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::SeqCst) <= 0
    }
}
