//! Entity Cache: latest-known state per named entity, kept in display order.
//!
//! One instance per monitored view. Entries are created on first sight of a
//! name in a cluster listing and are never deleted; a name that drops out of
//! the listing simply stops being surfaced by the snapshot builder. The
//! previous-counter map lives alongside the states so that a rate can be
//! derived across cycles even when an entity's full state was carried
//! forward unchanged.

use std::collections::{BTreeMap, HashMap};

/// A cached entity addressable by its display name.
///
/// For topics the name is the topic name, for consumer groups the group id.
pub trait Entity {
    fn name(&self) -> &str;
}

pub struct EntityCache<T> {
    entries: BTreeMap<String, T>,
    previous_counters: HashMap<String, i64>,
}

impl<T> EntityCache<T>
where
    T: Entity + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            previous_counters: HashMap::new(),
        }
    }

    /// Inserts or replaces the state stored under its own name. Replacing an
    /// existing entry updates the value in place without moving it.
    pub fn upsert(&mut self, state: T) {
        self.entries.insert(state.name().to_string(), state);
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    /// All cached states in ascending name order.
    pub fn sorted_snapshot(&self) -> Vec<T> {
        self.entries.values().cloned().collect()
    }

    /// Last cumulative counter observed for this name, if any cycle has
    /// recorded one.
    pub fn previous_counter(&self, name: &str) -> Option<i64> {
        self.previous_counters.get(name).copied()
    }

    pub fn set_previous_counter(&mut self, name: &str, value: i64) {
        self.previous_counters.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for EntityCache<T>
where
    T: Entity + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
