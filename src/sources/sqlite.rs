//! SQLite-backed metadata source.
//!
//! SQLite has neither catalogs nor schemas, so a data source over it is
//! always flat. Structural rows are read from `sqlite_master` and the
//! `pragma_*` table-valued functions and relabelled with the standard
//! metadata column names.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tracing::debug;

use crate::cache::lock;
use crate::cursor::names::{self, deferrability, index_type, nullable, rule};
use crate::cursor::{row_stream, DatabaseMetaData, MetaRequest, MetaRow, RowStream};
use crate::error::MetaResult;
use crate::session::{ContextProvider, ExecutionContext, Purpose};

const TABLES_QUERY: &str = r#"
SELECT name, type FROM sqlite_master
WHERE type IN ('table', 'view') AND (?1 IS NULL OR name = ?1)
ORDER BY name
"#;

const COLUMNS_QUERY: &str = r#"
SELECT m.name, p.cid, p.name, p.type, p."notnull", p.dflt_value, p.pk, m.sql
FROM sqlite_master m
JOIN pragma_table_info(m.name) p
WHERE m.type IN ('table', 'view') AND (?1 IS NULL OR m.name = ?1)
ORDER BY m.name, p.cid
"#;

const PRIMARY_KEYS_QUERY: &str = r#"
SELECT name, pk FROM pragma_table_info(?1)
WHERE pk > 0
ORDER BY pk
"#;

const UNIQUE_INDEX_COLUMNS_QUERY: &str = r#"
SELECT i.name, x.seqno, x.name
FROM pragma_index_list(?1) i
JOIN pragma_index_xinfo(i.name) x
WHERE i.origin = 'u' AND x.key = 1
ORDER BY i.name, x.seqno
"#;

// Parent table names are canonicalised through sqlite_master; a missing
// "to" column means the parent's primary key column at the same position.
const FOREIGN_KEYS_QUERY: &str = r#"
SELECT
    m.name,
    f.id,
    f.seq,
    COALESCE(
        (SELECT t.name FROM sqlite_master t
         WHERE t.type = 'table' AND t.name = f."table" COLLATE NOCASE),
        f."table"),
    f."from",
    COALESCE(
        f."to",
        (SELECT p.name FROM pragma_table_info(f."table") p WHERE p.pk = f.seq + 1)),
    f.on_update,
    f.on_delete
FROM sqlite_master m
JOIN pragma_foreign_key_list(m.name) f
WHERE m.type = 'table'
  AND (?1 IS NULL OR m.name = ?1)
  AND (?2 IS NULL OR f."table" = ?2 COLLATE NOCASE)
ORDER BY m.name, f.id, f.seq
"#;

const INDEX_INFO_QUERY: &str = r#"
SELECT i.name, i."unique", x.seqno, x.name, x."desc"
FROM pragma_index_list(?1) i
JOIN pragma_index_xinfo(i.name) x
WHERE x.key = 1 AND (?2 = 0 OR i."unique" = 1)
ORDER BY i.name, x.seqno
"#;

const TRIGGERS_QUERY: &str = r#"
SELECT name, tbl_name, sql FROM sqlite_master
WHERE type = 'trigger' AND (?1 IS NULL OR tbl_name = ?1)
ORDER BY name
"#;

/// An SQLite database exposed as a context provider.
///
/// The connection is locked per statement, never for the lifetime of a
/// context, so loads may open nested contexts freely.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    /// Open a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> MetaResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> MetaResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a batch of statements, typically DDL to set up a database.
    pub fn execute_batch(&self, sql: &str) -> MetaResult<()> {
        lock(&self.conn).execute_batch(sql)?;
        Ok(())
    }

    fn collect<P, F>(&self, sql: &str, params: P, map: F) -> MetaResult<Vec<MetaRow>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<MetaRow>,
    {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn table_types(&self) -> Vec<MetaRow> {
        ["TABLE", "VIEW", "SYSTEM TABLE"]
            .into_iter()
            .map(|t| MetaRow::new().with(names::TABLE_TYPE, t))
            .collect()
    }

    fn tables(&self, table: Option<&str>) -> MetaResult<Vec<MetaRow>> {
        self.collect(TABLES_QUERY, params![table], |row| {
            let name: String = row.get(0)?;
            let kind: String = row.get(1)?;
            let table_type = match kind.as_str() {
                "view" => "VIEW",
                _ if name.starts_with("sqlite_") => "SYSTEM TABLE",
                _ => "TABLE",
            };
            Ok(MetaRow::new()
                .with(names::TABLE_NAME, name)
                .with(names::TABLE_TYPE, table_type))
        })
    }

    fn columns(&self, table: Option<&str>) -> MetaResult<Vec<MetaRow>> {
        self.collect(COLUMNS_QUERY, params![table], |row| {
            let declared: Option<String> = row.get(3)?;
            let declared = declared.unwrap_or_default();
            let not_null: bool = row.get(4)?;
            let pk: i64 = row.get(6)?;
            let sql: Option<String> = row.get(7)?;
            let auto_increment = pk == 1
                && declared.eq_ignore_ascii_case("INTEGER")
                && sql.is_some_and(|s| s.to_ascii_uppercase().contains("AUTOINCREMENT"));
            let (size, digits) = declared_size(&declared);

            Ok(MetaRow::new()
                .with(names::TABLE_NAME, row.get::<_, String>(0)?)
                .with(names::ORDINAL_POSITION, row.get::<_, i64>(1)? + 1)
                .with(names::COLUMN_NAME, row.get::<_, String>(2)?)
                .with(names::TYPE_NAME, declared.clone())
                .with(names::DATA_TYPE, affinity_type_code(&declared))
                .with(names::COLUMN_SIZE, size)
                .with(names::DECIMAL_DIGITS, digits)
                .with(
                    names::NULLABLE,
                    if not_null {
                        nullable::NO_NULLS
                    } else {
                        nullable::NULLABLE
                    },
                )
                .with(names::IS_NULLABLE, if not_null { "NO" } else { "YES" })
                .with(names::COLUMN_DEF, row.get::<_, Option<String>>(5)?)
                .with(names::IS_AUTOINCREMENT, if auto_increment { "YES" } else { "NO" }))
        })
    }

    fn primary_keys(&self, table: &str) -> MetaResult<Vec<MetaRow>> {
        self.collect(PRIMARY_KEYS_QUERY, params![table], |row| {
            Ok(MetaRow::new()
                .with(names::TABLE_NAME, table)
                .with(names::COLUMN_NAME, row.get::<_, String>(0)?)
                .with(names::KEY_SEQ, row.get::<_, i64>(1)?))
        })
    }

    /// Primary key columns followed by the columns of `UNIQUE` constraints,
    /// in the vendor unique-key shape.
    fn unique_keys(&self, table: &str) -> MetaResult<Vec<MetaRow>> {
        let mut rows: Vec<MetaRow> = self
            .primary_keys(table)?
            .into_iter()
            .map(|row| {
                let seq = row.safe_get_long(names::KEY_SEQ);
                row.with(names::CONSTRAINT_TYPE, "PRIMARY KEY")
                    .with(names::ORDINAL_POSITION, seq)
            })
            .collect();
        rows.extend(
            self.collect(UNIQUE_INDEX_COLUMNS_QUERY, params![table], |row| {
                Ok(MetaRow::new()
                    .with(names::TABLE_NAME, table)
                    .with(names::CONSTRAINT_NAME, row.get::<_, String>(0)?)
                    .with(names::CONSTRAINT_TYPE, "UNIQUE")
                    .with(names::ORDINAL_POSITION, row.get::<_, i64>(1)? + 1)
                    .with(names::COLUMN_NAME, row.get::<_, Option<String>>(2)?))
            })?,
        );
        Ok(rows)
    }

    /// Foreign key rows; `child` narrows by defining table, `parent` by
    /// referenced table.
    fn foreign_keys(&self, child: Option<&str>, parent: Option<&str>) -> MetaResult<Vec<MetaRow>> {
        self.collect(FOREIGN_KEYS_QUERY, params![child, parent], |row| {
            let fk_table: String = row.get(0)?;
            let id: i64 = row.get(1)?;
            let on_update: String = row.get(6)?;
            let on_delete: String = row.get(7)?;
            Ok(MetaRow::new()
                .with(names::PKTABLE_NAME, row.get::<_, String>(3)?)
                .with(names::PKCOLUMN_NAME, row.get::<_, Option<String>>(5)?)
                .with(names::FKTABLE_NAME, fk_table.clone())
                .with(names::FKCOLUMN_NAME, row.get::<_, String>(4)?)
                .with(names::FK_NAME, format!("fk_{}_{}", fk_table, id))
                .with(names::KEY_SEQ, row.get::<_, i64>(2)? + 1)
                .with(names::UPDATE_RULE, rule_code(&on_update))
                .with(names::DELETE_RULE, rule_code(&on_delete))
                .with(names::DEFERRABILITY, deferrability::NOT_DEFERRABLE))
        })
    }

    fn index_info(&self, table: &str, unique_only: bool) -> MetaResult<Vec<MetaRow>> {
        self.collect(INDEX_INFO_QUERY, params![table, unique_only], |row| {
            let unique: bool = row.get(1)?;
            let descending: bool = row.get(4)?;
            Ok(MetaRow::new()
                .with(names::TABLE_NAME, table)
                .with(names::INDEX_NAME, row.get::<_, String>(0)?)
                .with(names::NON_UNIQUE, !unique)
                .with(names::TYPE, index_type::OTHER)
                .with(names::ORDINAL_POSITION, row.get::<_, i64>(2)? + 1)
                .with(names::COLUMN_NAME, row.get::<_, Option<String>>(3)?)
                .with(names::ASC_OR_DESC, if descending { "D" } else { "A" }))
        })
    }

    fn triggers(&self, table: Option<&str>) -> MetaResult<Vec<MetaRow>> {
        self.collect(TRIGGERS_QUERY, params![table], |row| {
            let sql: Option<String> = row.get(2)?;
            let (timing, event) = sql.as_deref().map(trigger_shape).unwrap_or_default();
            Ok(MetaRow::new()
                .with(names::TRIGGER_SCHEMA, "")
                .with(names::TRIGGER_NAME, row.get::<_, String>(0)?)
                .with(names::EVENT_OBJECT_TABLE, row.get::<_, String>(1)?)
                .with(names::ACTION_TIMING, timing)
                .with(names::EVENT_MANIPULATION, event)
                .with(names::ACTION_STATEMENT, sql))
        })
    }

    fn query_string(&self, sql: &str) -> MetaResult<Option<String>> {
        let conn = lock(&self.conn);
        let value = conn
            .query_row(sql, [], |row| row.get::<_, Value>(0))
            .optional()?;
        Ok(value.and_then(|value| match value {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Text(s) => Some(s),
            Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
        }))
    }
}

impl ContextProvider for SqliteSource {
    fn open_context(
        &self,
        purpose: Purpose,
        description: &str,
    ) -> MetaResult<Box<dyn ExecutionContext + '_>> {
        debug!(?purpose, description, "sqlite context");
        Ok(Box::new(SqliteContext { source: self }))
    }
}

struct SqliteContext<'a> {
    source: &'a SqliteSource,
}

impl ExecutionContext for SqliteContext<'_> {
    fn metadata(&self) -> &dyn DatabaseMetaData {
        self
    }

    fn current_catalog(&self) -> MetaResult<Option<String>> {
        Ok(None)
    }

    fn query_string(&self, sql: &str) -> MetaResult<Option<String>> {
        self.source.query_string(sql)
    }

    fn execute(&self, sql: &str) -> MetaResult<()> {
        self.source.execute_batch(sql)
    }
}

impl DatabaseMetaData for SqliteContext<'_> {
    fn describe(&self, request: &MetaRequest) -> MetaResult<RowStream<'_>> {
        let source = self.source;
        let rows = match request {
            MetaRequest::TableTypes => source.table_types(),
            // No catalogs or schemas: the data source falls back to flat
            MetaRequest::Catalogs | MetaRequest::Schemas { .. } | MetaRequest::AllSchemas => {
                Vec::new()
            }
            MetaRequest::Tables { table, .. } => source.tables(table.as_deref())?,
            MetaRequest::Columns { table, .. } => source.columns(table.as_deref())?,
            MetaRequest::PrimaryKeys { table, .. } => source.primary_keys(table)?,
            MetaRequest::UniqueKeys { table, .. } => source.unique_keys(table)?,
            MetaRequest::ImportedKeys { table, .. } => {
                source.foreign_keys(Some(table.as_str()), None)?
            }
            MetaRequest::ExportedKeys { table, .. } => {
                source.foreign_keys(None, Some(table.as_str()))?
            }
            MetaRequest::IndexInfo {
                table, unique_only, ..
            } => source.index_info(table, *unique_only)?,
            MetaRequest::Triggers { .. } => source.triggers(None)?,
            MetaRequest::TableTriggers { table, .. } => {
                source.triggers(Some(table.as_str()))?
            }
        };
        Ok(row_stream(rows))
    }
}

/// Map an SQLite `ON UPDATE`/`ON DELETE` action to its rule code.
pub fn rule_code(action: &str) -> i32 {
    match action.trim().to_ascii_uppercase().as_str() {
        "CASCADE" => rule::CASCADE,
        "RESTRICT" => rule::RESTRICT,
        "SET NULL" => rule::SET_NULL,
        "SET DEFAULT" => rule::SET_DEFAULT,
        _ => rule::NO_ACTION,
    }
}

/// SQL type code for a declared column type, by SQLite affinity rules.
fn affinity_type_code(declared: &str) -> i32 {
    const INTEGER: i32 = 4;
    const NUMERIC: i32 = 2;
    const DOUBLE: i32 = 8;
    const VARCHAR: i32 = 12;
    const BLOB: i32 = 2004;

    let upper = declared.to_ascii_uppercase();
    if upper.contains("INT") {
        INTEGER
    } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| upper.contains(t)) {
        VARCHAR
    } else if upper.is_empty() || upper.contains("BLOB") {
        BLOB
    } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| upper.contains(t)) {
        DOUBLE
    } else {
        NUMERIC
    }
}

/// Length and scale from a declared type such as `DECIMAL(10, 2)`.
fn declared_size(declared: &str) -> (i64, i64) {
    let Some(args) = declared
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(args, _)| args)
    else {
        return (0, 0);
    };
    let mut parts = args.split(',').map(|p| p.trim().parse::<i64>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

/// Timing and event keywords of a `CREATE TRIGGER` statement.
fn trigger_shape(sql: &str) -> (Option<String>, Option<String>) {
    let upper = sql.to_ascii_uppercase();
    let words: Vec<&str> = upper.split_whitespace().collect();
    let timing = words.windows(2).find_map(|w| match w {
        ["INSTEAD", "OF"] => Some("INSTEAD OF".to_string()),
        ["BEFORE", _] | ["AFTER", _] => Some(w[0].to_string()),
        _ => None,
    });
    let event = words
        .iter()
        .find(|w| matches!(**w, "INSERT" | "UPDATE" | "DELETE"))
        .map(|w| w.to_string());
    (timing, event)
}
