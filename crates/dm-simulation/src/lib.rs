//! Tick-based simulation for Duskmoor.
//!
//! Provides the system scheduler and the game systems that operate on a
//! shared [`dm_core::World`]. Every tick reads one immutable snapshot,
//! stages all writes in a [`WriteBuffer`], and commits them at the end, so
//! systems never observe each other's half-finished state except through
//! the buffer's read-your-writes view.

/// Per-tick staging of component writes.
pub mod buffer;
/// Simulation clock counting ticks.
pub mod clock;
/// Combat initiation, round resolution and fleeing.
pub mod combat;
/// Request components deposited by the command layer.
pub mod commands;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// Death detection and experience awards.
pub mod death;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// Template-driven entity creation.
pub mod factory;
/// Movement between rooms and into dynamic regions.
pub mod movement;
/// System execution order and write-conflict checks.
pub mod ordering;
/// Resource regeneration over time.
pub mod regeneration;
/// Procedurally generated regions.
pub mod region;
/// Room restocking from respawn tables.
pub mod respawn;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that all simulation systems implement.
pub mod system;

#[cfg(test)]
mod test_support;

pub use buffer::{CommitFailure, CommitReport, WriteBuffer};
pub use clock::SimClock;
pub use combat::{CombatInitiationSystem, CombatSystem};
pub use config::{CombatConfig, MovementConfig, RegenerationConfig, SimConfig};
pub use context::TickContext;
pub use death::DeathSystem;
pub use error::{SimError, SimResult};
pub use event::{EventLog, SimEvent, SimEventKind};
pub use factory::{EntityFactory, FactoryError, ItemTemplate, MobTemplate, TemplateFactory};
pub use movement::MovementSystem;
pub use regeneration::RegenerationSystem;
pub use region::{
    GeneratedRoom, GenerationError, GenerationRequest, ProceduralRegions, RegionBounds,
    RegionDef, RegionExitDef, RegionGenerator,
};
pub use respawn::RespawnSystem;
pub use simulation::{Simulation, TickReport, standard_systems};
pub use system::{DEFAULT_PRIORITY, System, SystemView};
