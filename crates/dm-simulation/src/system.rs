use dm_core::{Component, ComponentSet, EntityId, WorldSnapshot};

use crate::context::TickContext;
use crate::error::SimResult;

/// Default priority for systems that do not care where they run.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A simulation subsystem that runs each tick.
///
/// Systems read the pre-tick snapshot through a [`SystemView`] and stage
/// every write in the tick's write buffer. Execution order comes from
/// [`System::depends_on`] first, then [`System::priority`] (lower runs
/// first), then registration order.
pub trait System: Send + std::fmt::Debug {
    /// Unique name, used for dependencies and reporting.
    fn name(&self) -> &'static str;

    /// Component kinds an entity must carry to be processed.
    fn required(&self) -> ComponentSet;

    /// Component kinds read when present.
    fn optional(&self) -> ComponentSet {
        ComponentSet::EMPTY
    }

    /// Component kinds written through the buffer.
    fn writes(&self) -> ComponentSet;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Systems that must run before this one in every tick.
    fn depends_on(&self) -> &[&'static str] {
        &[]
    }

    /// Process every matching entity. Returns how many were acted on.
    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize>;

    /// Support downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// The snapshot as seen by one system: the entities matching its
/// required set, in id order.
#[derive(Debug)]
pub struct SystemView<'a> {
    snapshot: &'a WorldSnapshot,
    entities: Vec<EntityId>,
}

impl<'a> SystemView<'a> {
    pub fn new(snapshot: &'a WorldSnapshot, required: ComponentSet) -> Self {
        Self {
            snapshot,
            entities: snapshot.entities_matching(required),
        }
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn snapshot(&self) -> &'a WorldSnapshot {
        self.snapshot
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&'a C> {
        self.snapshot.get::<C>(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
