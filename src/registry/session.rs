use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::container::{ContainerID, ContainerRecord};

/// Per-caller view of the registry used by
/// [`super::ContainerRegistry::get_all_accepted`].
///
/// Tracks every container id the caller has been shown (`full`) and the
/// subset that passed the caller's filter (`matched`). Each collection config
/// owns one session; sessions are never shared between callers.
#[derive(Debug, Clone, Default)]
pub struct DiffSession {
    pub(super) full: HashSet<ContainerID>,
    pub(super) matched: HashMap<ContainerID, Arc<ContainerRecord>>,
}

impl DiffSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the container has been seen by this session.
    pub fn contains(&self, id: &str) -> bool {
        self.full.contains(id)
    }

    /// Whether the container was accepted by this session's filter.
    pub fn is_matched(&self, id: &str) -> bool {
        self.matched.contains_key(id)
    }

    /// The record as it was when the container was first accepted.
    pub fn get(&self, id: &str) -> Option<&Arc<ContainerRecord>> {
        self.matched.get(id)
    }

    pub fn matched(&self) -> impl Iterator<Item = &Arc<ContainerRecord>> {
        self.matched.values()
    }

    pub fn full_len(&self) -> usize {
        self.full.len()
    }

    pub fn matched_len(&self) -> usize {
        self.matched.len()
    }

    /// Forgets everything, so the next query reports every live container as
    /// new. Used when a config's filter changes.
    pub fn reset(&mut self) {
        self.full.clear();
        self.matched.clear();
    }
}

/// Changes observed by one query of a [`DiffSession`].
#[derive(Debug, Clone, Default)]
pub struct MatchDelta {
    /// Newly matched containers.
    pub added: Vec<Arc<ContainerRecord>>,
    /// Previously matched containers that have been purged.
    pub removed: Vec<ContainerID>,
}

impl MatchDelta {
    pub fn new_count(&self) -> usize {
        self.added.len()
    }

    pub fn delete_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
