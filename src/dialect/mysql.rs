//! MySQL flavour of the metadata graph.

use std::sync::Arc;

use tracing::debug;

use super::{Dialect, KeyColumnRow};
use crate::cache::Load;
use crate::cursor::{names, MetaRequest, MetaRow, Scope};
use crate::error::{MetaResult, ResolutionWarning};
use crate::model::{ConstraintKind, Table, TableDescriptor, Trigger};
use crate::monitor::ProgressMonitor;
use crate::session::{Purpose, Session};

const INNODB_COMMENT: &str = "InnoDB free";

/// Remove the free-space note InnoDB appends to table comments.
pub fn strip_innodb_comment(comment: &str) -> &str {
    if comment.starts_with(INNODB_COMMENT) {
        return "";
    }
    match comment.find(&format!("; {}", INNODB_COMMENT)) {
        Some(pos) => &comment[..pos],
        None => comment,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn table_descriptor(&self, row: &MetaRow) -> TableDescriptor {
        let comment = if row.has(names::TABLE_COMMENT) {
            row.safe_get_string(names::TABLE_COMMENT)
        } else {
            row.safe_get_string(names::REMARKS)
        };
        let comment = strip_innodb_comment(&comment);

        let mut descriptor = TableDescriptor::new(
            row.safe_get_string(names::TABLE_NAME),
            row.safe_get_string(names::TABLE_TYPE),
        );
        descriptor.description = (!comment.is_empty()).then(|| comment.to_string());
        descriptor.engine = row.get_non_empty(names::ENGINE);
        descriptor.row_count = row
            .has(names::TABLE_ROWS)
            .then(|| row.safe_get_long(names::TABLE_ROWS));
        descriptor.auto_increment = row
            .has(names::AUTO_INCREMENT)
            .then(|| row.safe_get_long(names::AUTO_INCREMENT));
        descriptor
    }

    fn unique_keys_request(&self, scope: Scope, table: &str) -> MetaRequest {
        MetaRequest::UniqueKeys {
            scope,
            table: table.to_string(),
        }
    }

    fn unique_key_row(&self, row: &MetaRow) -> Option<KeyColumnRow> {
        let kind = ConstraintKind::from_type_name(&row.safe_get_string(names::CONSTRAINT_TYPE))?;
        Some(KeyColumnRow {
            name: row.get_non_empty(names::CONSTRAINT_NAME),
            kind,
            column: row.safe_get_string(names::COLUMN_NAME),
            key_seq: row.safe_get_int(names::ORDINAL_POSITION),
        })
    }

    /// Only owner and trigger names are listed per table; the triggers
    /// themselves come from the owning catalog's trigger cache.
    fn load_table_triggers(
        &self,
        table: &Arc<Table>,
        monitor: &dyn ProgressMonitor,
    ) -> MetaResult<Load<Vec<Arc<Trigger>>>> {
        let data_source = table.data_source()?;
        let session = Session::open(
            data_source.provider(),
            Purpose::Meta,
            &format!("Load table '{}' triggers", table.name()),
        )?;
        let request = MetaRequest::TableTriggers {
            scope: table.scope(),
            table: table.name().to_string(),
        };
        debug!(%request, "loading table triggers");

        let mut triggers = Vec::new();
        let mut canceled = false;
        for row in session.metadata().describe(&request)? {
            if monitor.is_canceled() {
                canceled = true;
                break;
            }
            let row = row?;
            let owner_name = row.safe_get_string(names::TRIGGER_SCHEMA);
            let trigger_name = row.safe_get_string(names::TRIGGER_NAME);

            let owner = if owner_name.is_empty() {
                Some(table.owner()?)
            } else {
                data_source.find_container(monitor, &owner_name)?
            };
            let Some(owner) = owner else {
                ResolutionWarning::TriggerOwnerNotFound { owner: owner_name }.log();
                continue;
            };
            match owner.trigger(monitor, &trigger_name)? {
                Some(trigger) => triggers.push(trigger),
                None => ResolutionWarning::TriggerNotFound {
                    owner: owner.name().to_string(),
                    trigger: trigger_name,
                }
                .log(),
            }
        }
        let canceled = canceled || monitor.is_canceled();
        Ok(Load::new(triggers, canceled))
    }
}
