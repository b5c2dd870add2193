use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::entity::EntityId;

/// Per-component-type storage.
///
/// Each entity's value sits behind its own mutex. The map-level lock is only
/// held long enough to look up, insert or remove an entry, so concurrent
/// `mutate` calls on one entity serialise while calls on different
/// entities proceed independently.
pub struct ComponentStore<C> {
    entries: RwLock<HashMap<EntityId, Arc<Mutex<C>>>>,
}

impl<C> Default for ComponentStore<C> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<C> fmt::Debug for ComponentStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStore")
            .field("len", &self.len())
            .finish()
    }
}

impl<C: Clone> ComponentStore<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: EntityId) -> Option<Arc<Mutex<C>>> {
        self.entries.read().get(&id).cloned()
    }

    pub fn get(&self, id: EntityId) -> Option<C> {
        let entry = self.entry(id)?;
        let value = entry.lock().clone();
        Some(value)
    }

    pub fn get_all(&self) -> HashMap<EntityId, C> {
        let entries: Vec<(EntityId, Arc<Mutex<C>>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(entry)))
            .collect();
        entries
            .into_iter()
            .map(|(id, entry)| {
                let value = entry.lock().clone();
                (id, value)
            })
            .collect()
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn create(&self, id: EntityId, value: C) -> Option<C> {
        let mut entries = self.entries.write();
        match entries.get(&id) {
            Some(entry) => Some(std::mem::replace(&mut *entry.lock(), value)),
            None => {
                entries.insert(id, Arc::new(Mutex::new(value)));
                None
            }
        }
    }

    pub fn delete(&self, id: EntityId) -> Option<C> {
        let entry = self.entries.write().remove(&id)?;
        let value = entry.lock().clone();
        Some(value)
    }

    /// Run `f` against the stored value under that entity's lock.
    ///
    /// Returns `None` without calling `f` if the entity has no value here.
    pub fn mutate<R>(&self, id: EntityId, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let entry = self.entry(id)?;
        let mut guard = entry.lock();
        Some(f(&mut guard))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entries.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl<C> ComponentStore<C> {
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
