// src/model/trigger.rs
use std::sync::{Arc, Weak};

use crate::cursor::names;
use crate::cursor::MetaRow;
use crate::model::Container;

/// A trigger, owned by a catalog or schema.
#[derive(Debug)]
pub struct Trigger {
    owner: Weak<Container>,
    pub name: String,
    /// Name of the table the trigger fires on
    pub table_name: Option<String>,
    /// INSERT / UPDATE / DELETE
    pub event: Option<String>,
    /// BEFORE / AFTER
    pub timing: Option<String>,
    pub body: Option<String>,
}

impl Trigger {
    pub fn from_row(owner: &Arc<Container>, row: &MetaRow) -> Self {
        Self {
            owner: Arc::downgrade(owner),
            name: row.safe_get_string(names::TRIGGER_NAME),
            table_name: row.get_non_empty(names::EVENT_OBJECT_TABLE),
            event: row.get_non_empty(names::EVENT_MANIPULATION),
            timing: row.get_non_empty(names::ACTION_TIMING),
            body: row.get_non_empty(names::ACTION_STATEMENT),
        }
    }

    pub fn owner(&self) -> Option<Arc<Container>> {
        self.owner.upgrade()
    }
}
