use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::Load;
use crate::error::{MetaResult, ResolutionWarning};
use crate::model::{Constraint, ConstraintColumn, Table};
use crate::monitor::ProgressMonitor;
use crate::session::{Purpose, Session};

/// Load the primary and unique keys of `table`.
///
/// Rows are grouped by key name; a key is created when its first row
/// arrives, even if none of its columns resolve.
pub fn load_unique_keys(
    table: &Arc<Table>,
    monitor: &dyn ProgressMonitor,
) -> MetaResult<Load<Vec<Arc<Constraint>>>> {
    let data_source = table.data_source()?;
    let dialect = data_source.dialect();
    let session = Session::open(
        data_source.provider(),
        Purpose::Meta,
        &format!("Load table '{}' unique keys", table.name()),
    )?;
    let request = dialect.unique_keys_request(table.scope(), table.name());
    debug!(%request, "loading unique keys");

    let mut keys: Vec<Constraint> = Vec::new();
    let mut by_name: HashMap<Option<String>, usize> = HashMap::new();
    let mut canceled = false;
    for row in session.metadata().describe(&request)? {
        if monitor.is_canceled() {
            canceled = true;
            break;
        }
        let row = row?;
        let Some(key_row) = dialect.unique_key_row(&row) else {
            continue;
        };

        let index = *by_name.entry(key_row.name.clone()).or_insert_with(|| {
            keys.push(Constraint::new(table, key_row.name.clone(), key_row.kind));
            keys.len() - 1
        });

        if key_row.column.is_empty() {
            continue;
        }
        match table.column(monitor, &key_row.column)? {
            Some(column) => keys[index].columns.push(ConstraintColumn {
                column,
                key_seq: key_row.key_seq,
            }),
            None => ResolutionWarning::ConstraintColumnNotFound {
                table: table.full_name(),
                column: key_row.column,
            }
            .log(),
        }
    }

    let canceled = canceled || monitor.is_canceled();
    let keys = keys.into_iter().map(Arc::new).collect();
    Ok(Load::new(keys, canceled))
}
