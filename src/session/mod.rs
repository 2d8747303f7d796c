//! Execution contexts.
//!
//! The structure graph never talks to a connection directly. Each load opens
//! a short-lived [`ExecutionContext`] through the data source's
//! [`ContextProvider`], runs its describe requests, and closes it again.
//! [`Session`] is the scoped handle: the context is closed when the session
//! is dropped, on every exit path including `?` propagation.
//!
//! Pooling and connection reuse are the provider's business.

use std::ops::Deref;

use tracing::trace;

use crate::cursor::DatabaseMetaData;
use crate::error::MetaResult;

/// Why a context is being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Structural metadata reads.
    Meta,
    /// Small utility statements (active catalog probes, row counts).
    Utility,
}

/// An open session against the database.
pub trait ExecutionContext {
    /// Metadata cursor adapter of this session.
    fn metadata(&self) -> &dyn DatabaseMetaData;

    /// The session's current catalog, if the driver reports one.
    fn current_catalog(&self) -> MetaResult<Option<String>>;

    /// Run a query and return the first column of its first row as text.
    fn query_string(&self, sql: &str) -> MetaResult<Option<String>>;

    /// Execute a statement that returns no rows.
    fn execute(&self, sql: &str) -> MetaResult<()>;

    /// Release the session. Called exactly once, by [`Session`]'s drop.
    fn close(&mut self) {}
}

/// Opens execution contexts for a data source.
pub trait ContextProvider: Send + Sync {
    /// Open a new context.
    fn open_context(
        &self,
        purpose: Purpose,
        description: &str,
    ) -> MetaResult<Box<dyn ExecutionContext + '_>>;

    /// Driver-level shutdown hook, called with the configured URL suffix
    /// when the data source is closed.
    fn shutdown(&self, _url_suffix: &str) -> MetaResult<()> {
        Ok(())
    }
}

/// Scoped execution context; closes the context on drop.
pub struct Session<'a> {
    inner: Box<dyn ExecutionContext + 'a>,
    description: String,
}

impl<'a> Session<'a> {
    /// Open a session through a provider.
    pub fn open(
        provider: &'a dyn ContextProvider,
        purpose: Purpose,
        description: &str,
    ) -> MetaResult<Self> {
        trace!(description, ?purpose, "opening execution context");
        let inner = provider.open_context(purpose, description)?;
        Ok(Self {
            inner,
            description: description.to_string(),
        })
    }
}

impl<'a> Deref for Session<'a> {
    type Target = dyn ExecutionContext + 'a;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.inner.close();
        trace!(description = %self.description, "execution context closed");
    }
}
