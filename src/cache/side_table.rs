//! Auxiliary state keyed by entity identity.
//!
//! Consumers that need to hang view state off a structural entity (a diagram
//! node for a table, an expanded flag for a tree item) keep it here instead
//! of inside the entity. Keys are the address of the entity's `Arc`; a weak
//! handle guards against address reuse after the entity is dropped.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

/// Owner-keyed map from entities to auxiliary values.
pub struct SideTable<E, V> {
    entries: DashMap<usize, (Weak<E>, V)>,
}

impl<E, V> Default for SideTable<E, V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

fn key_of<E>(entity: &Arc<E>) -> usize {
    Arc::as_ptr(entity) as *const () as usize
}

impl<E, V: Clone> SideTable<E, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a value with an entity, replacing any previous one.
    pub fn insert(&self, entity: &Arc<E>, value: V) -> Option<V> {
        self.entries
            .insert(key_of(entity), (Arc::downgrade(entity), value))
            .and_then(|(owner, old)| owner.upgrade().map(|_| old))
    }

    /// Value associated with a live entity.
    pub fn get(&self, entity: &Arc<E>) -> Option<V> {
        let entry = self.entries.get(&key_of(entity))?;
        let (owner, value) = entry.value();
        match owner.upgrade() {
            Some(live) if Arc::ptr_eq(&live, entity) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn remove(&self, entity: &Arc<E>) -> Option<V> {
        self.entries
            .remove(&key_of(entity))
            .map(|(_, (_, value))| value)
    }

    /// Drop entries whose entity no longer exists.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (owner, _)| owner.strong_count() > 0);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide "last used view per object kind" registry.
///
/// Passed explicitly to whatever opens object views; populated on the first
/// switch and read the next time an object of the same kind is opened.
#[derive(Debug, Default)]
pub struct EditorDefaults {
    views: DashMap<String, String>,
}

impl EditorDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, kind: &str, view: &str) {
        self.views.insert(kind.to_string(), view.to_string());
    }

    pub fn last_view(&self, kind: &str) -> Option<String> {
        self.views.get(kind).map(|v| v.value().clone())
    }

    pub fn clear(&self) {
        self.views.clear();
    }
}
