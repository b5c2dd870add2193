use std::collections::{BTreeMap, HashMap};

use crate::component::Location;
use crate::entity::EntityId;
use crate::kind::{Component, ComponentKind, ComponentSet, ComponentValue};
use crate::world::EntityRecord;

/// One entity's components at snapshot time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityComponents {
    kinds: ComponentSet,
    values: HashMap<ComponentKind, ComponentValue>,
}

impl EntityComponents {
    pub fn insert(&mut self, value: ComponentValue) {
        let kind = value.kind();
        self.kinds.insert(kind);
        self.values.insert(kind, value);
    }

    pub fn get<C: Component>(&self) -> Option<&C> {
        self.values.get(&C::KIND).and_then(C::view)
    }

    pub fn value(&self, kind: ComponentKind) -> Option<&ComponentValue> {
        self.values.get(&kind)
    }

    pub fn kinds(&self) -> ComponentSet {
        self.kinds
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in component-kind order.
    pub fn values(&self) -> impl Iterator<Item = &ComponentValue> {
        self.kinds.iter().filter_map(|kind| self.values.get(&kind))
    }
}

/// Immutable copy of the world taken at the start of a tick.
///
/// Systems read only from the snapshot, so every system in a tick sees
/// the same pre-tick state regardless of what earlier systems staged.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    entities: BTreeMap<EntityId, EntityComponents>,
}

impl WorldSnapshot {
    pub(crate) fn insert_entity(&mut self, id: EntityId, components: EntityComponents) {
        self.entities.insert(id, components);
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.entities.get(&id).and_then(EntityComponents::get::<C>)
    }

    pub fn components(&self, id: EntityId) -> Option<&EntityComponents> {
        self.entities.get(&id)
    }

    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.kinds_of(id).contains(C::KIND)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn kinds_of(&self, id: EntityId) -> ComponentSet {
        self.entities
            .get(&id)
            .map(EntityComponents::kinds)
            .unwrap_or_default()
    }

    /// Entities carrying every kind in `required`, in id order.
    pub fn entities_matching(&self, required: ComponentSet) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, components)| components.kinds().contains_all(required))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Entities located in `room`, ordered by arrival tick then id.
    pub fn entities_in_room(&self, room: EntityId) -> Vec<EntityId> {
        let mut present: Vec<(u64, EntityId)> = self
            .entities
            .iter()
            .filter_map(|(id, components)| {
                let location = components.get::<Location>()?;
                (location.room == room).then_some((location.entered_at, *id))
            })
            .collect();
        present.sort();
        present.into_iter().map(|(_, id)| id).collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn records(&self) -> Vec<EntityRecord> {
        self.entities
            .iter()
            .map(|(id, components)| EntityRecord {
                id: *id,
                components: components.values().cloned().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Identity, Stats};
    use crate::entity::EntityKind;
    use crate::world::World;

    #[test]
    fn entities_in_room_orders_by_arrival() {
        let world = World::new();
        let room = EntityId::new(EntityKind::Room);
        let elsewhere = EntityId::new(EntityKind::Room);
        let late = EntityId::new(EntityKind::Mob);
        let early = EntityId::new(EntityKind::Mob);
        let away = EntityId::new(EntityKind::Mob);
        world.insert(late, Location::new(room, 9));
        world.insert(early, Location::new(room, 2));
        world.insert(away, Location::new(elsewhere, 1));

        let snapshot = world.snapshot();
        assert_eq!(snapshot.entities_in_room(room), vec![early, late]);
        assert_eq!(snapshot.entities_in_room(elsewhere), vec![away]);
    }

    #[test]
    fn matching_and_typed_get() {
        let world = World::new();
        let id = EntityId::new(EntityKind::Mob);
        world.insert(id, Identity::new("wolf"));
        world.insert(id, Stats::default().with_health(30));
        let other = EntityId::new(EntityKind::Item);
        world.insert(other, Identity::new("bone"));

        let snapshot = world.snapshot();
        let fighters = snapshot.entities_matching(ComponentSet::of(&[ComponentKind::Stats]));
        assert_eq!(fighters, vec![id]);
        assert_eq!(snapshot.get::<Stats>(id).unwrap().health.max, 30);
        assert!(snapshot.get::<Stats>(other).is_none());
        assert!(snapshot.has::<Identity>(other));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn records_list_values_in_kind_order() {
        let world = World::new();
        let id = EntityId::new(EntityKind::Mob);
        world.insert(id, Stats::default());
        world.insert(id, Identity::new("bat"));
        let records = world.snapshot().records();
        let kinds: Vec<ComponentKind> = records[0].components.iter().map(ComponentValue::kind).collect();
        assert_eq!(kinds, vec![ComponentKind::Identity, ComponentKind::Stats]);
    }
}
