//! Load-once slots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::error::MetaResult;

/// Outcome of a load callback.
#[derive(Debug)]
pub enum Load<T> {
    /// The load ran to completion; the value is cached.
    Complete(T),
    /// The load was cancelled part way; the value is returned to the caller
    /// but not cached, so the next access loads again.
    Partial(T),
}

impl<T> Load<T> {
    /// `Complete` unless cancellation was observed.
    pub fn new(value: T, canceled: bool) -> Self {
        if canceled {
            Load::Partial(value)
        } else {
            Load::Complete(value)
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Load<U> {
        match self {
            Load::Complete(v) => Load::Complete(f(v)),
            Load::Partial(v) => Load::Partial(f(v)),
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Load::Complete(v) | Load::Partial(v) => v,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Load::Complete(_))
    }
}

/// A value that is loaded on first access and cached until invalidated.
#[derive(Debug)]
pub struct LazySlot<V> {
    value: Mutex<Option<V>>,
    load_lock: Mutex<()>,
    loads: AtomicUsize,
}

/// Lazily loaded, shared collection.
pub type LazyList<T> = LazySlot<Arc<Vec<T>>>;

impl<V> Default for LazySlot<V> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
            load_lock: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }
}

impl<V: Clone> LazySlot<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, without loading.
    pub fn get(&self) -> Option<V> {
        lock(&self.value).clone()
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.value).is_some()
    }

    /// Return the cached value or run `load` to produce it.
    ///
    /// Concurrent callers on the same slot wait for a single load and share
    /// its result. A failed load stores nothing and propagates the error.
    pub fn get_or_load<F>(&self, load: F) -> MetaResult<V>
    where
        F: FnOnce() -> MetaResult<Load<V>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _guard = lock(&self.load_lock);
        // Another caller may have finished while we waited
        if let Some(value) = self.get() {
            return Ok(value);
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        match load()? {
            Load::Complete(value) => Ok(self.set_if_absent(value)),
            Load::Partial(value) => Ok(value),
        }
    }

    /// Store a value unless one is already cached; returns the cached value.
    ///
    /// Used by container-wide loads that fan results out to sibling slots.
    pub fn set_if_absent(&self, value: V) -> V {
        let mut slot = lock(&self.value);
        slot.get_or_insert(value).clone()
    }

    /// Replace the cached value.
    pub fn set(&self, value: V) {
        *lock(&self.value) = Some(value);
    }

    /// Drop the cached value so the next access loads again.
    ///
    /// Returns whether a value was cached.
    pub fn invalidate(&self) -> bool {
        lock(&self.value).take().is_some()
    }

    /// Number of load callbacks run so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}
