//! Sparse table of live entities.

use std::sync::Arc;

use schema::{SendTable, ServerClass};

use crate::entity::Entity;

/// Live entities keyed by entity index.
///
/// Slots grow on demand; callers bound indices before inserting.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    slots: Vec<Option<Entity>>,
    len: usize,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `slots` preallocated entries.
    #[must_use]
    pub fn with_capacity(slots: usize) -> Self {
        let mut entries = Vec::with_capacity(slots);
        entries.resize_with(slots, || None);
        Self {
            slots: entries,
            len: 0,
        }
    }

    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Entity> {
        self.slots.get(usize::from(index)).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: u16) -> Option<&mut Entity> {
        self.slots.get_mut(usize::from(index)).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn contains(&self, index: u16) -> bool {
        self.get(index).is_some()
    }

    /// Returns the entity at `index`, creating it if the slot is empty.
    ///
    /// An existing entity is returned unchanged, even if `class` differs.
    pub fn create_if_absent(
        &mut self,
        index: u16,
        class: Arc<ServerClass>,
        table: Arc<SendTable>,
        serial: u32,
    ) -> &mut Entity {
        let slot = usize::from(index);
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        let entry = &mut self.slots[slot];
        if entry.is_none() {
            self.len += 1;
        }
        entry.get_or_insert_with(|| Entity::new(index, serial, class, table))
    }

    pub fn remove(&mut self, index: u16) -> Option<Entity> {
        let removed = self.slots.get_mut(usize::from(index)).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Iterates live entities in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }
}
