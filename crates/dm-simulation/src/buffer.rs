//! Per-tick staging of component writes.

use std::collections::HashMap;
use std::sync::Arc;

use dm_core::{Component, ComponentKind, ComponentValue, EntityId, World, WorldSnapshot};

/// A staged operation on one (entity, component kind) slot.
#[derive(Debug, Clone, PartialEq)]
enum Staged {
    /// Insert or overwrite regardless of the live state.
    Create(ComponentValue),
    /// Overwrite a component that must still exist at commit time.
    Update(ComponentValue),
    Delete,
}

/// A staged write that could not be applied at commit time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitFailure {
    #[error("{kind} of {entity} vanished before commit")]
    Stale { entity: EntityId, kind: ComponentKind },
}

/// Outcome of [`WriteBuffer::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub applied: usize,
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects the writes of every system during one tick.
///
/// Reads through the buffer see the buffer's own staged values first and
/// fall back to the pre-tick snapshot. Nothing staged here is visible to
/// the snapshot or the live world until [`WriteBuffer::commit`].
#[derive(Debug)]
pub struct WriteBuffer {
    snapshot: Arc<WorldSnapshot>,
    staged: HashMap<(EntityId, ComponentKind), Staged>,
    order: Vec<(EntityId, ComponentKind)>,
}

impl WriteBuffer {
    pub fn new(snapshot: Arc<WorldSnapshot>) -> Self {
        Self {
            snapshot,
            staged: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    fn stage(&mut self, id: EntityId, kind: ComponentKind, op: Staged) {
        let key = (id, kind);
        let op = match (self.staged.get(&key), op) {
            // An update on top of a staged create or delete must recreate
            // the component at commit time.
            (Some(Staged::Create(_) | Staged::Delete), Staged::Update(value)) => {
                Staged::Create(value)
            }
            (_, op) => op,
        };
        if self.staged.insert(key, op).is_none() {
            self.order.push(key);
        }
    }

    /// Overwrite an existing component.
    pub fn write<C: Component>(&mut self, id: EntityId, value: C) {
        self.stage(id, C::KIND, Staged::Update(value.into_value()));
    }

    /// Insert a component whether or not the entity already carries one.
    pub fn create<C: Component>(&mut self, id: EntityId, value: C) {
        self.stage(id, C::KIND, Staged::Create(value.into_value()));
    }

    pub fn delete<C: Component>(&mut self, id: EntityId) {
        self.stage(id, C::KIND, Staged::Delete);
    }

    /// Read-your-writes view: the staged value if any, else the snapshot's.
    pub fn read<C: Component>(&self, id: EntityId) -> Option<C> {
        match self.staged.get(&(id, C::KIND)) {
            Some(Staged::Create(value) | Staged::Update(value)) => C::view(value).cloned(),
            Some(Staged::Delete) => None,
            None => self.snapshot.get::<C>(id).cloned(),
        }
    }

    /// Apply `f` to the current view of a component and stage the result.
    ///
    /// Returns `None` without calling `f` when there is nothing to mutate.
    pub fn mutate<C: Component, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Option<R> {
        let mut value = self.read::<C>(id)?;
        let result = f(&mut value);
        self.write(id, value);
        Some(result)
    }

    pub fn is_staged<C: Component>(&self, id: EntityId) -> bool {
        self.staged.contains_key(&(id, C::KIND))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Apply every staged operation to `world` in first-touch order.
    ///
    /// An update whose component no longer exists in the live store is
    /// reported as stale and skipped; everything else is still applied.
    /// Applied writes are never rolled back.
    pub fn commit(mut self, world: &World) -> CommitReport {
        let mut report = CommitReport::default();
        for key in std::mem::take(&mut self.order) {
            let Some(op) = self.staged.remove(&key) else {
                continue;
            };
            let (entity, kind) = key;
            match op {
                Staged::Create(value) => {
                    world.insert_value(entity, value);
                    report.applied += 1;
                }
                Staged::Update(value) => {
                    if world.replace_value(entity, value) {
                        report.applied += 1;
                    } else {
                        let failure = CommitFailure::Stale { entity, kind };
                        tracing::warn!("commit skipped: {failure}");
                        report.failures.push(failure);
                    }
                }
                Staged::Delete => {
                    world.remove_value(entity, kind);
                    report.applied += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::{EntityKind, Position, Stats};

    fn world_with_stats() -> (World, EntityId) {
        let world = World::new();
        let id = EntityId::new(EntityKind::Mob);
        world.insert(id, Stats::default().with_health(10));
        (world, id)
    }

    fn buffer_for(world: &World) -> WriteBuffer {
        WriteBuffer::new(Arc::new(world.snapshot()))
    }

    #[test]
    fn writes_are_invisible_to_snapshot() {
        let (world, id) = world_with_stats();
        let mut buffer = buffer_for(&world);
        buffer.mutate::<Stats, _>(id, |s| s.apply_health_delta(-4));
        assert_eq!(buffer.read::<Stats>(id).unwrap().health.current, 6);
        assert_eq!(buffer.snapshot().get::<Stats>(id).unwrap().health.current, 10);
        assert_eq!(world.get::<Stats>(id).unwrap().health.current, 10);
    }

    #[test]
    fn mutate_builds_on_staged_value() {
        let (world, id) = world_with_stats();
        let mut buffer = buffer_for(&world);
        buffer.mutate::<Stats, _>(id, |s| s.apply_health_delta(-3));
        buffer.mutate::<Stats, _>(id, |s| s.apply_health_delta(-3));
        let report = buffer.commit(&world);
        assert!(report.is_clean());
        assert_eq!(report.applied, 1);
        assert_eq!(world.get::<Stats>(id).unwrap().health.current, 4);
    }

    #[test]
    fn mutate_missing_component_is_none() {
        let (world, id) = world_with_stats();
        let mut buffer = buffer_for(&world);
        assert!(buffer.mutate::<Position, _>(id, |_| ()).is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn delete_hides_value_and_removes_on_commit() {
        let (world, id) = world_with_stats();
        let mut buffer = buffer_for(&world);
        buffer.delete::<Stats>(id);
        assert!(buffer.read::<Stats>(id).is_none());
        buffer.commit(&world);
        assert!(!world.has::<Stats>(id));
    }

    #[test]
    fn create_adds_new_component() {
        let (world, id) = world_with_stats();
        let mut buffer = buffer_for(&world);
        buffer.create(id, Position::Resting);
        buffer.mutate::<Position, _>(id, |p| *p = Position::Sleeping);
        buffer.commit(&world);
        assert_eq!(world.get::<Position>(id), Some(Position::Sleeping));
    }

    #[test]
    fn update_to_despawned_entity_is_stale_but_commit_continues() {
        let (world, id) = world_with_stats();
        let other = EntityId::new(EntityKind::Player);
        world.insert(other, Position::Sitting);

        let mut buffer = buffer_for(&world);
        buffer.mutate::<Stats, _>(id, |s| s.apply_health_delta(-1));
        buffer.write(other, Position::Standing);
        world.despawn(id);

        let report = buffer.commit(&world);
        assert_eq!(
            report.failures,
            vec![CommitFailure::Stale {
                entity: id,
                kind: ComponentKind::Stats
            }]
        );
        assert_eq!(report.applied, 1);
        assert!(!world.contains(id));
        assert_eq!(world.get::<Position>(other), Some(Position::Standing));
    }

    #[test]
    fn commit_applies_in_first_touch_order() {
        let world = World::new();
        let id = EntityId::new(EntityKind::Player);
        let mut buffer = buffer_for(&world);
        buffer.create(id, Position::Sitting);
        buffer.create(id, Stats::default());
        buffer.delete::<Position>(id);
        // Position was touched first, so it is committed first (as a delete).
        assert_eq!(buffer.len(), 2);
        buffer.commit(&world);
        assert!(!world.has::<Position>(id));
        assert!(world.has::<Stats>(id));
    }
}
