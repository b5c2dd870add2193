//! Core types for Duskmoor: entities, components, and the world runtime.
//!
//! State lives in one [`ComponentStore`] per [`ComponentKind`]; an
//! [`EntityIndex`] records which kinds each entity carries. The [`World`]
//! ties them together and can be shared across threads as `Arc<World>`.

/// Component data types (identity, location, stats, combat, requests).
pub mod component;
/// Entity identifiers and kinds.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Per-entity component-kind bookkeeping.
pub mod index;
/// The component kind registry and type-erased values.
pub mod kind;
/// Rooms, exits, directions and dynamic-region coordinates.
pub mod room;
/// Immutable per-tick copies of the world.
pub mod snapshot;
/// Per-component-type storage with per-entity locking.
pub mod store;
/// The live world runtime context.
pub mod world;

pub use component::{
    AttackRequest, AttackTarget, Combat, CombatState, FleeRequest, Identity, Location,
    MovementRequest, Position, Resource, Stats,
};
pub use entity::{EntityId, EntityKind};
pub use error::{CoreError, CoreResult};
pub use index::EntityIndex;
pub use kind::{Component, ComponentKind, ComponentSet, ComponentValue};
pub use room::{
    Direction, Door, Exit, ExitTarget, RegionId, RespawnTable, Room, RoomFlags, SpawnEntry,
    WorldCoordinate,
};
pub use snapshot::{EntityComponents, WorldSnapshot};
pub use store::ComponentStore;
pub use world::{EntityRecord, World};
