use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::Load;
use crate::cursor::{names, MetaRequest};
use crate::error::{MetaResult, ResolutionWarning};
use crate::model::{Index, IndexColumn, IndexType, Table};
use crate::monitor::ProgressMonitor;
use crate::session::{Purpose, Session};

/// Load the indexes of `table`, all of them and with exact statistics.
pub fn load_indexes(
    table: &Arc<Table>,
    monitor: &dyn ProgressMonitor,
) -> MetaResult<Load<Vec<Arc<Index>>>> {
    // Columns first so index rows can link to them
    table.columns(monitor)?;

    let data_source = table.data_source()?;
    let session = Session::open(
        data_source.provider(),
        Purpose::Meta,
        &format!("Load table '{}' indexes", table.name()),
    )?;
    let request = MetaRequest::IndexInfo {
        scope: table.scope(),
        table: table.name().to_string(),
        unique_only: false,
        approximate: false,
    };
    debug!(%request, "loading indexes");

    let mut indexes: Vec<Index> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut canceled = false;
    for row in session.metadata().describe(&request)? {
        if monitor.is_canceled() {
            canceled = true;
            break;
        }
        let row = row?;
        let name = row.safe_get_string(names::INDEX_NAME);
        if name.is_empty() {
            // Table statistics rows carry no index name
            continue;
        }

        let index = match by_name.get(&name) {
            Some(&index) => index,
            None => {
                indexes.push(Index::new(
                    table,
                    name.clone(),
                    !row.safe_get_boolean(names::NON_UNIQUE),
                    row.get_non_empty(names::INDEX_QUALIFIER),
                    IndexType::from_code(row.safe_get_int(names::TYPE)),
                ));
                by_name.insert(name, indexes.len() - 1);
                indexes.len() - 1
            }
        };

        let column_name = row.safe_get_string(names::COLUMN_NAME);
        match table.column(monitor, &column_name)? {
            Some(column) => indexes[index].columns.push(IndexColumn {
                column,
                ordinal: row.safe_get_int(names::ORDINAL_POSITION),
                ascending: !row
                    .safe_get_string(names::ASC_OR_DESC)
                    .eq_ignore_ascii_case("D"),
            }),
            None => ResolutionWarning::IndexColumnNotFound {
                table: table.full_name(),
                column: column_name,
            }
            .log(),
        }
    }

    // Includes a cancelled column load done on the way
    let canceled = canceled || monitor.is_canceled();
    let indexes = indexes.into_iter().map(Arc::new).collect();
    Ok(Load::new(indexes, canceled))
}
