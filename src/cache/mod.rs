//! Lazy container cache and identity-keyed side tables.
//!
//! Every structural collection (tables of a container, columns, indexes,
//! constraints, foreign keys and triggers of a table) lives in a
//! [`LazySlot`]. An empty slot means "not loaded yet"; the first access runs
//! the load callback and stores its result until the slot is invalidated.
//!
//! # Concurrency
//!
//! Each slot serializes its own loads: racers that arrive while a load is in
//! flight wait for it and then reuse its result, so at most one load per
//! slot runs at a time. Loads never re-enter the slot they fill. Nested
//! loads always go from foreign keys to constraints/indexes to columns,
//! which keeps lock acquisition acyclic.

mod lazy;
mod side_table;

pub use lazy::{Load, LazyList, LazySlot};
pub use side_table::{EditorDefaults, SideTable};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data of a poisoned lock.
///
/// Slots only ever hold fully-built values, so a panic in another thread
/// cannot leave them half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
