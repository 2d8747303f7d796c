//! Foreign key resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::Load;
use crate::cursor::{names, MetaRequest, MetaRow};
use crate::datasource::DataSource;
use crate::error::{MetaResult, ResolutionWarning};
use crate::model::{
    full_table_name, CascadeRule, Column, Constraint, ConstraintColumn, Deferrability, ForeignKey,
    ForeignKeyColumn, Table,
};
use crate::monitor::ProgressMonitor;
use crate::session::{Purpose, Session};

/// Which end of the foreign keys a scan starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    /// Keys defined on the table ("owned foreign keys").
    Imported,
    /// Keys of other tables referencing the table ("references").
    Exported,
}

/// One decoded imported/exported-keys row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub pk_catalog: Option<String>,
    pub pk_schema: Option<String>,
    pub pk_table: String,
    pub pk_column: String,
    pub pk_name: Option<String>,
    pub fk_catalog: Option<String>,
    pub fk_schema: Option<String>,
    pub fk_table: String,
    pub fk_column: String,
    pub fk_name: Option<String>,
    pub key_seq: i32,
    pub update_rule: CascadeRule,
    pub delete_rule: CascadeRule,
    pub deferrability: Deferrability,
}

impl KeyRow {
    pub fn from_row(row: &MetaRow) -> Self {
        Self {
            pk_catalog: row.get_non_empty(names::PKTABLE_CAT),
            pk_schema: row.get_non_empty(names::PKTABLE_SCHEM),
            pk_table: row.safe_get_string(names::PKTABLE_NAME),
            pk_column: row.safe_get_string(names::PKCOLUMN_NAME),
            pk_name: row.get_non_empty(names::PK_NAME),
            fk_catalog: row.get_non_empty(names::FKTABLE_CAT),
            fk_schema: row.get_non_empty(names::FKTABLE_SCHEM),
            fk_table: row.safe_get_string(names::FKTABLE_NAME),
            fk_column: row.safe_get_string(names::FKCOLUMN_NAME),
            fk_name: row.get_non_empty(names::FK_NAME),
            key_seq: row.safe_get_int(names::KEY_SEQ),
            update_rule: CascadeRule::from_code(row.safe_get_int(names::UPDATE_RULE)),
            delete_rule: CascadeRule::from_code(row.safe_get_int(names::DELETE_RULE)),
            deferrability: Deferrability::from_code(row.safe_get_int(names::DEFERRABILITY)),
        }
    }

    fn pk_table_full_name(&self) -> String {
        full_table_name(
            self.pk_catalog.as_deref(),
            self.pk_schema.as_deref(),
            &self.pk_table,
        )
    }

    fn fk_table_full_name(&self) -> String {
        full_table_name(
            self.fk_catalog.as_deref(),
            self.fk_schema.as_deref(),
            &self.fk_table,
        )
    }
}

/// Scan the imported or exported keys of `table`.
///
/// A cancelled scan returns the keys finished so far as [`Load::Partial`].
pub fn load_foreign_keys(
    table: &Arc<Table>,
    direction: KeyDirection,
    monitor: &dyn ProgressMonitor,
) -> MetaResult<Load<Vec<Arc<ForeignKey>>>> {
    let data_source = table.data_source()?;
    let session = Session::open(
        data_source.provider(),
        Purpose::Meta,
        &format!("Load table '{}' foreign keys", table.name()),
    )?;
    let request = match direction {
        KeyDirection::Imported => MetaRequest::ImportedKeys {
            scope: table.scope(),
            table: table.name().to_string(),
        },
        KeyDirection::Exported => MetaRequest::ExportedKeys {
            scope: table.scope(),
            table: table.name().to_string(),
        },
    };
    debug!(%request, "loading foreign keys");

    let mut scan = KeyScan::new(&data_source, direction);
    let mut canceled = false;
    for row in session.metadata().describe(&request)? {
        if monitor.is_canceled() {
            canceled = true;
            break;
        }
        scan.accept(KeyRow::from_row(&row?), monitor)?;
        monitor.worked(1);
    }
    // A nested table or column load may have seen the cancellation and
    // left rows unresolved
    let canceled = canceled || monitor.is_canceled();
    Ok(Load::new(scan.finish(), canceled))
}

/// Referenced key of a foreign key under construction.
enum KeyRef {
    Listed(Arc<Constraint>),
    Synthetic(usize),
}

struct SyntheticKey {
    table: Arc<Table>,
    name: Option<String>,
    columns: Vec<ConstraintColumn>,
}

struct ForeignKeyBuilder {
    table: Arc<Table>,
    name: Option<String>,
    key: KeyRef,
    delete_rule: CascadeRule,
    update_rule: CascadeRule,
    deferrability: Deferrability,
    columns: Vec<ForeignKeyColumn>,
}

/// Result slot, in first-seen order.
enum Entry {
    Reused(Arc<ForeignKey>),
    Built(usize),
}

/// Scratch state of one foreign key scan.
struct KeyScan<'a> {
    data_source: &'a DataSource,
    direction: KeyDirection,
    synthetic: Vec<SyntheticKey>,
    synthetic_index: HashMap<String, usize>,
    builders: Vec<ForeignKeyBuilder>,
    builder_index: HashMap<(String, Option<String>), usize>,
    entries: Vec<Entry>,
}

impl<'a> KeyScan<'a> {
    fn new(data_source: &'a DataSource, direction: KeyDirection) -> Self {
        Self {
            data_source,
            direction,
            synthetic: Vec::new(),
            synthetic_index: HashMap::new(),
            builders: Vec::new(),
            builder_index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn accept(&mut self, row: KeyRow, monitor: &dyn ProgressMonitor) -> MetaResult<()> {
        let Some(resolved) = self.resolve_ends(&row, monitor)? else {
            return Ok(());
        };
        let ResolvedEnds {
            pk_table,
            fk_table,
            pk_column,
            fk_column,
        } = resolved;

        let key = self.referenced_key(&row, &pk_table, &pk_column, monitor)?;

        if self.direction == KeyDirection::Exported {
            if let Some(name) = row.fk_name.as_deref() {
                let existing = fk_table
                    .foreign_keys(monitor)?
                    .iter()
                    .find(|fk| fk.name_matches(Some(name)))
                    .cloned();
                match existing {
                    Some(fk) => {
                        let seen = self.entries.iter().any(|entry| {
                            matches!(entry, Entry::Reused(known) if Arc::ptr_eq(known, &fk))
                        });
                        if !seen {
                            self.entries.push(Entry::Reused(fk));
                        }
                        return Ok(());
                    }
                    None => ResolutionWarning::ForeignKeyNotFound {
                        table: fk_table.full_name(),
                        key: name.to_string(),
                    }
                    .log(),
                }
            }
        }

        let slot = (row.fk_table_full_name(), row.fk_name.clone());
        let index = match self.builder_index.get(&slot) {
            Some(&index) => index,
            None => {
                let index = self.builders.len();
                self.builders.push(ForeignKeyBuilder {
                    table: fk_table,
                    name: row.fk_name.clone(),
                    key,
                    delete_rule: row.delete_rule,
                    update_rule: row.update_rule,
                    deferrability: row.deferrability,
                    columns: Vec::new(),
                });
                self.builder_index.insert(slot, index);
                self.entries.push(Entry::Built(index));
                index
            }
        };
        self.builders[index].columns.push(ForeignKeyColumn {
            column: fk_column,
            key_seq: row.key_seq,
            referenced_column: pk_column,
        });
        Ok(())
    }

    /// Find both tables and both columns; `None` skips the row.
    fn resolve_ends(
        &self,
        row: &KeyRow,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Option<ResolvedEnds>> {
        let Some(pk_table) = self.data_source.find_table(
            monitor,
            row.pk_catalog.as_deref(),
            row.pk_schema.as_deref(),
            &row.pk_table,
        )?
        else {
            ResolutionWarning::PkTableNotFound {
                table: row.pk_table_full_name(),
            }
            .log();
            return Ok(None);
        };
        let Some(fk_table) = self.data_source.find_table(
            monitor,
            row.fk_catalog.as_deref(),
            row.fk_schema.as_deref(),
            &row.fk_table,
        )?
        else {
            ResolutionWarning::FkTableNotFound {
                table: row.fk_table_full_name(),
            }
            .log();
            return Ok(None);
        };
        let Some(pk_column) = pk_table.column(monitor, &row.pk_column)? else {
            ResolutionWarning::PkColumnNotFound {
                table: row.pk_table_full_name(),
                column: row.pk_column.clone(),
            }
            .log();
            return Ok(None);
        };
        let Some(fk_column) = fk_table.column(monitor, &row.fk_column)? else {
            ResolutionWarning::FkColumnNotFound {
                table: row.fk_table_full_name(),
                column: row.fk_column.clone(),
            }
            .log();
            return Ok(None);
        };
        Ok(Some(ResolvedEnds {
            pk_table,
            fk_table,
            pk_column,
            fk_column,
        }))
    }

    /// Referenced key: by name, else a listed key holding the column, else a
    /// synthetic primary key shared by every row naming the same missing key.
    fn referenced_key(
        &mut self,
        row: &KeyRow,
        pk_table: &Arc<Table>,
        pk_column: &Arc<Column>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<KeyRef> {
        let keys = pk_table.constraints(monitor)?;

        if let Some(name) = row.pk_name.as_deref() {
            if let Some(key) = keys.iter().find(|k| k.name_matches(name)) {
                return Ok(KeyRef::Listed(key.clone()));
            }
            ResolutionWarning::UniqueKeyNotFound {
                table: pk_table.full_name(),
                key: name.to_string(),
            }
            .log();
        }

        if let Some(key) = keys.iter().find(|k| k.contains(pk_column)) {
            return Ok(KeyRef::Listed(key.clone()));
        }

        ResolutionWarning::PrimaryKeyFabricated {
            table: pk_table.full_name(),
        }
        .log();
        let scratch_name = format!(
            "{}.{}",
            row.pk_table_full_name(),
            row.pk_name.as_deref().unwrap_or_default()
        );
        let index = match self.synthetic_index.get(&scratch_name) {
            Some(&index) => index,
            None => {
                let index = self.synthetic.len();
                self.synthetic.push(SyntheticKey {
                    table: pk_table.clone(),
                    name: row.pk_name.clone(),
                    columns: Vec::new(),
                });
                self.synthetic_index.insert(scratch_name, index);
                index
            }
        };
        let key = &mut self.synthetic[index];
        if !key.columns.iter().any(|c| Arc::ptr_eq(&c.column, pk_column)) {
            key.columns.push(ConstraintColumn {
                column: pk_column.clone(),
                key_seq: row.key_seq,
            });
        }
        Ok(KeyRef::Synthetic(index))
    }

    fn finish(self) -> Vec<Arc<ForeignKey>> {
        let synthetic: Vec<Arc<Constraint>> = self
            .synthetic
            .into_iter()
            .map(|mut key| {
                key.columns.sort_by_key(|c| c.key_seq);
                let mut constraint = Constraint::synthetic(&key.table, key.name);
                constraint.columns = key.columns;
                Arc::new(constraint)
            })
            .collect();

        let mut built: Vec<Option<Arc<ForeignKey>>> = self
            .builders
            .into_iter()
            .map(|builder| {
                let referenced = match builder.key {
                    KeyRef::Listed(key) => key,
                    KeyRef::Synthetic(index) => synthetic[index].clone(),
                };
                let mut fk = ForeignKey::new(
                    &builder.table,
                    builder.name,
                    referenced,
                    builder.delete_rule,
                    builder.update_rule,
                    builder.deferrability,
                );
                fk.columns = builder.columns;
                fk.columns.sort_by_key(|c| c.key_seq);
                Some(Arc::new(fk))
            })
            .collect();

        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Reused(fk) => Some(fk),
                Entry::Built(index) => built[index].take(),
            })
            .collect()
    }
}

struct ResolvedEnds {
    pk_table: Arc<Table>,
    fk_table: Arc<Table>,
    pk_column: Arc<Column>,
    fk_column: Arc<Column>,
}
