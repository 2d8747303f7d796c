//! Concrete metadata sources.
//!
//! Each source implements [`crate::session::ContextProvider`]:
//!
//! - [`SqliteSource`]: a live SQLite database (flat topology).
//! - [`SnapshotSource`]: captured metadata rows replayed from JSON.

pub mod snapshot;
pub mod sqlite;

pub use snapshot::{Snapshot, SnapshotSource};
pub use sqlite::SqliteSource;
