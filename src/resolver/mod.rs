//! Constraint and key resolver.
//!
//! Turns raw key, index and trigger rows into linked model objects. The
//! hard part is foreign keys: the imported-keys scan of one table and the
//! exported-keys scan of another describe the same keys from opposite ends,
//! drivers may leave names out, and the referenced key may not be listed at
//! all. The resolver reconciles both directions into one PK ↔ FK graph.
//!
//! # Row-level recovery
//!
//! A row whose table, column or key cannot be resolved is logged as a
//! [`crate::error::ResolutionWarning`] and skipped; the rest of the scan
//! continues. Only I/O-level failures abort a load.
//!
//! # Ordering
//!
//! Foreign key columns are sorted by key sequence once the scan finishes
//! (stable, so equal sequences keep arrival order). Unique key and index
//! columns keep the order the driver reported them in.

mod indexes;
mod keys;
mod unique;

pub use indexes::load_indexes;
pub use keys::{load_foreign_keys, KeyDirection, KeyRow};
pub use unique::load_unique_keys;
