//! Progress reporting and cooperative cancellation.
//!
//! Every long-running load takes a `&dyn ProgressMonitor` and polls
//! [`ProgressMonitor::is_canceled`] between rows and between tables. A
//! cancelled load stops early and hands back whatever it has built so far.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

/// Progress sink and cancellation token supplied by the caller.
pub trait ProgressMonitor: Sync {
    fn begin_task(&self, _name: &str, _units: u64) {}

    fn sub_task(&self, _name: &str) {}

    fn worked(&self, _units: u64) {}

    fn is_canceled(&self) -> bool {
        false
    }

    fn done(&self) {}
}

/// Monitor that reports nothing and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {}

/// Shared cancellation flag.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Monitor that forwards progress to `tracing` and honours a [`CancelFlag`].
#[derive(Debug, Default)]
pub struct LoggingMonitor {
    cancel: CancelFlag,
    worked: AtomicU64,
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            worked: AtomicU64::new(0),
        }
    }

    /// Cancellation handle for this monitor.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Total units reported through `worked`.
    pub fn total_worked(&self) -> u64 {
        self.worked.load(Ordering::Relaxed)
    }
}

impl ProgressMonitor for LoggingMonitor {
    fn begin_task(&self, name: &str, units: u64) {
        debug!(task = name, units, "begin task");
    }

    fn sub_task(&self, name: &str) {
        trace!(subtask = name);
    }

    fn worked(&self, units: u64) {
        self.worked.fetch_add(units, Ordering::Relaxed);
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_set()
    }

    fn done(&self) {
        trace!("task done");
    }
}
