use serde::{Deserialize, Serialize};

use crate::component::{
    AttackRequest, Combat, FleeRequest, Identity, Location, MovementRequest, Position, Stats,
};
use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::index::EntityIndex;
use crate::kind::{Component, ComponentKind, ComponentSet, ComponentValue};
use crate::room::Room;
use crate::snapshot::{EntityComponents, WorldSnapshot};
use crate::store::ComponentStore;

/// Binds `$ty` to the concrete component type for a runtime `ComponentKind`.
macro_rules! with_component_type {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            ComponentKind::Identity => {
                type $ty = Identity;
                $body
            }
            ComponentKind::Location => {
                type $ty = Location;
                $body
            }
            ComponentKind::Room => {
                type $ty = Room;
                $body
            }
            ComponentKind::Stats => {
                type $ty = Stats;
                $body
            }
            ComponentKind::Combat => {
                type $ty = Combat;
                $body
            }
            ComponentKind::Position => {
                type $ty = Position;
                $body
            }
            ComponentKind::MovementRequest => {
                type $ty = MovementRequest;
                $body
            }
            ComponentKind::AttackRequest => {
                type $ty = AttackRequest;
                $body
            }
            ComponentKind::FleeRequest => {
                type $ty = FleeRequest;
                $body
            }
        }
    };
}

/// One typed store per component kind.
#[derive(Debug, Default)]
pub(crate) struct ComponentStores {
    pub(crate) identity: ComponentStore<Identity>,
    pub(crate) location: ComponentStore<Location>,
    pub(crate) room: ComponentStore<Room>,
    pub(crate) stats: ComponentStore<Stats>,
    pub(crate) combat: ComponentStore<Combat>,
    pub(crate) position: ComponentStore<Position>,
    pub(crate) movement_request: ComponentStore<MovementRequest>,
    pub(crate) attack_request: ComponentStore<AttackRequest>,
    pub(crate) flee_request: ComponentStore<FleeRequest>,
}

/// The serialized form of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub components: Vec<ComponentValue>,
}

/// The live world: every component store plus the entity index.
///
/// A `World` is an explicitly constructed runtime context. It is
/// `Send + Sync` and is meant to be shared as `Arc<World>` between the
/// scheduler and external callers such as a command layer.
#[derive(Debug, Default)]
pub struct World {
    stores: ComponentStores,
    index: EntityIndex,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stores(&self) -> &ComponentStores {
        &self.stores
    }

    pub fn store<C: Component>(&self) -> &ComponentStore<C> {
        C::store(self)
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    // -----------------------------------------------------------------------
    // Typed access
    // -----------------------------------------------------------------------

    /// Insert or overwrite a component. Returns the previous value.
    ///
    /// The store and the index change under the index's write lock, so a
    /// concurrent insert and remove of the same kind cannot leave them out
    /// of step. Lock order is always index, then store.
    pub fn insert<C: Component>(&self, id: EntityId, value: C) -> Option<C> {
        self.index.add_with(id, C::KIND, || C::store(self).create(id, value))
    }

    pub fn remove<C: Component>(&self, id: EntityId) -> Option<C> {
        self.index.remove_with(id, C::KIND, || C::store(self).delete(id))
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<C> {
        C::store(self).get(id)
    }

    /// Like [`World::get`], but a missing entity or component is an error.
    pub fn require<C: Component>(&self, id: EntityId) -> CoreResult<C> {
        if !self.index.contains(id) {
            return Err(CoreError::EntityNotFound(id));
        }
        self.get(id).ok_or(CoreError::ComponentMissing {
            entity: id,
            kind: C::KIND,
        })
    }

    pub fn mutate<C: Component, R>(&self, id: EntityId, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        C::store(self).mutate(id, f)
    }

    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.index.has(id, C::KIND)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains(id)
    }

    pub fn kinds_of(&self, id: EntityId) -> ComponentSet {
        self.index.kinds_of(id)
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.index.entities()
    }

    pub fn entities_matching(&self, required: ComponentSet) -> Vec<EntityId> {
        self.index.matching(required)
    }

    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    /// Remove every component of `id` and its index entry.
    /// Returns false if the entity was unknown.
    pub fn despawn(&self, id: EntityId) -> bool {
        let kinds = self.index.kinds_of(id);
        if kinds.is_empty() {
            return false;
        }
        for kind in kinds.iter() {
            self.remove_value(id, kind);
        }
        self.index.remove_entity(id);
        true
    }

    // -----------------------------------------------------------------------
    // Type-erased access
    // -----------------------------------------------------------------------

    pub fn get_value(&self, id: EntityId, kind: ComponentKind) -> Option<ComponentValue> {
        with_component_type!(kind, C => self.get::<C>(id).map(C::into_value))
    }

    pub fn insert_value(&self, id: EntityId, value: ComponentValue) -> Option<ComponentValue> {
        let kind = value.kind();
        with_component_type!(kind, C => {
            C::from_value(value)
                .and_then(|component| self.insert(id, component))
                .map(C::into_value)
        })
    }

    /// Overwrite an existing component in place. Returns false, leaving
    /// the world untouched, if the entity no longer carries that kind.
    pub fn replace_value(&self, id: EntityId, value: ComponentValue) -> bool {
        let kind = value.kind();
        with_component_type!(kind, C => {
            match C::from_value(value) {
                Some(component) => C::store(self)
                    .mutate(id, move |slot| *slot = component)
                    .is_some(),
                None => false,
            }
        })
    }

    pub fn remove_value(&self, id: EntityId, kind: ComponentKind) -> Option<ComponentValue> {
        with_component_type!(kind, C => self.remove::<C>(id).map(C::into_value))
    }

    // -----------------------------------------------------------------------
    // Snapshots and records
    // -----------------------------------------------------------------------

    /// Copy every entity's components into an immutable snapshot.
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::default();
        for id in self.index.entities() {
            let mut components = EntityComponents::default();
            for kind in self.index.kinds_of(id).iter() {
                // A concurrent remove may have emptied the store already.
                if let Some(value) = self.get_value(id, kind) {
                    components.insert(value);
                }
            }
            if !components.is_empty() {
                snapshot.insert_entity(id, components);
            }
        }
        snapshot
    }

    pub fn records(&self) -> Vec<EntityRecord> {
        self.snapshot().records()
    }

    pub fn from_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        let world = Self::new();
        for record in records {
            for value in record.components {
                world.insert_value(record.id, value);
            }
        }
        world
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let records: Vec<EntityRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }
}
