use std::collections::HashMap;

use parking_lot::RwLock;

use crate::entity::EntityId;
use crate::kind::{ComponentKind, ComponentSet};

/// Tracks which component kinds each entity currently carries.
#[derive(Debug, Default)]
pub struct EntityIndex {
    sets: RwLock<HashMap<EntityId, ComponentSet>>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: EntityId, kind: ComponentKind) {
        self.sets.write().entry(id).or_default().insert(kind);
    }

    /// Drop `kind` from the entity. An entity left with no kinds is removed.
    pub fn remove(&self, id: EntityId, kind: ComponentKind) {
        self.remove_with(id, kind, || ());
    }

    /// Run `store_update` and record `kind` for `id` under one write lock,
    /// so no reader or writer sees the store and the index disagree.
    pub(crate) fn add_with<R>(
        &self,
        id: EntityId,
        kind: ComponentKind,
        store_update: impl FnOnce() -> R,
    ) -> R {
        let mut sets = self.sets.write();
        let result = store_update();
        sets.entry(id).or_default().insert(kind);
        result
    }

    /// Counterpart of [`EntityIndex::add_with`] for removal.
    pub(crate) fn remove_with<R>(
        &self,
        id: EntityId,
        kind: ComponentKind,
        store_update: impl FnOnce() -> R,
    ) -> R {
        let mut sets = self.sets.write();
        let result = store_update();
        if let Some(set) = sets.get_mut(&id) {
            set.remove(kind);
            if set.is_empty() {
                sets.remove(&id);
            }
        }
        result
    }

    pub fn remove_entity(&self, id: EntityId) -> ComponentSet {
        self.sets.write().remove(&id).unwrap_or_default()
    }

    pub fn kinds_of(&self, id: EntityId) -> ComponentSet {
        self.sets.read().get(&id).copied().unwrap_or_default()
    }

    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.kinds_of(id).contains(kind)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.sets.read().contains_key(&id)
    }

    /// Entities carrying every kind in `required`, in id order.
    pub fn matching(&self, required: ComponentSet) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .sets
            .read()
            .iter()
            .filter(|(_, set)| set.contains_all(required))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn entities(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.sets.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }
}
