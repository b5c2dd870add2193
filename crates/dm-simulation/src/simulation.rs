use std::sync::Arc;

use dm_core::{AttackTarget, Direction, EntityId, World};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::buffer::{CommitReport, WriteBuffer};
use crate::clock::SimClock;
use crate::combat::{CombatInitiationSystem, CombatSystem};
use crate::commands;
use crate::config::SimConfig;
use crate::context::TickContext;
use crate::death::DeathSystem;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent};
use crate::factory::{EntityFactory, TemplateFactory};
use crate::movement::MovementSystem;
use crate::ordering::resolve_order;
use crate::region::{ProceduralRegions, RegionGenerator};
use crate::regeneration::RegenerationSystem;
use crate::respawn::RespawnSystem;
use crate::system::{System, SystemView};

/// Fresh instances of the six game systems, in registration order.
pub fn standard_systems() -> Vec<Box<dyn System>> {
    vec![
        Box::new(CombatInitiationSystem::new()),
        Box::new(MovementSystem::new()),
        Box::new(CombatSystem::new()),
        Box::new(DeathSystem::new()),
        Box::new(RegenerationSystem::new()),
        Box::new(RespawnSystem::new()),
    ]
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Entities acted on, per system, in execution order.
    pub processed: Vec<(&'static str, usize)>,
    /// Systems that returned an error, with the error text.
    pub failed: Vec<(&'static str, String)>,
    pub commit: CommitReport,
    pub events: Vec<SimEvent>,
}

impl TickReport {
    pub fn processed_by(&self, system: &str) -> Option<usize> {
        self.processed
            .iter()
            .find(|(name, _)| *name == system)
            .map(|(_, count)| *count)
    }
}

/// The top-level simulation orchestrator.
///
/// Owns the clock, RNG, event log, and registered systems, and shares the
/// world with the command layer. Each tick takes one snapshot, runs every
/// system against it in dependency order, and commits the staged writes.
pub struct Simulation {
    world: Arc<World>,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    config: SimConfig,
    systems: Vec<Box<dyn System>>,
    order: Vec<usize>,
    initialized: bool,
    regions: Arc<dyn RegionGenerator>,
    factory: Arc<dyn EntityFactory>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("systems", &self.systems.len())
            .field("entities", &self.world.entity_count())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Simulation {
    /// Create a new simulation over a shared world.
    ///
    /// Starts with no dynamic regions and no templates; see
    /// [`Simulation::with_regions`] and [`Simulation::with_factory`].
    pub fn new(world: Arc<World>, config: SimConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Self {
            world,
            clock: SimClock::new(),
            rng,
            events,
            config,
            systems: Vec::new(),
            order: Vec::new(),
            initialized: false,
            regions: Arc::new(ProceduralRegions::new()),
            factory: Arc::new(TemplateFactory::new()),
        }
    }

    pub fn with_regions(mut self, regions: Arc<dyn RegionGenerator>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn EntityFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Register the built-in game systems.
    pub fn with_standard_systems(mut self) -> SimResult<Self> {
        for system in standard_systems() {
            self.add_boxed_system(system)?;
        }
        Ok(self)
    }

    /// Register a system. The execution order is recomputed before the
    /// next tick.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> SimResult<()> {
        self.add_boxed_system(Box::new(system))
    }

    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> SimResult<()> {
        if self.systems.iter().any(|s| s.name() == system.name()) {
            return Err(SimError::DuplicateSystem(system.name().to_string()));
        }
        tracing::debug!(system = system.name(), "registered system");
        self.systems.push(system);
        self.initialized = false;
        Ok(())
    }

    /// Resolve and validate the execution order of all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.order = resolve_order(&self.systems)?;
        self.initialized = true;
        tracing::debug!(order = ?self.system_names(), "system order resolved");
        Ok(())
    }

    /// Names of the registered systems in execution order.
    pub fn system_order(&mut self) -> SimResult<Vec<&'static str>> {
        self.init()?;
        Ok(self.system_names())
    }

    fn system_names(&self) -> Vec<&'static str> {
        self.order.iter().map(|i| self.systems[*i].name()).collect()
    }

    /// Advance the simulation by one tick.
    ///
    /// A system that fails is logged and skipped; the writes it staged
    /// before failing are still committed. Only an invalid system set
    /// makes the tick itself fail.
    pub fn tick(&mut self) -> SimResult<TickReport> {
        self.init()?;
        let tick = self.clock.advance();

        let snapshot = Arc::new(self.world.snapshot());
        let mut buffer = WriteBuffer::new(Arc::clone(&snapshot));
        let mut events = Vec::new();
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        for &index in &self.order {
            let system = &mut self.systems[index];
            let view = SystemView::new(&snapshot, system.required());
            let mut ctx = TickContext {
                buffer: &mut buffer,
                events: &mut events,
                rng: &mut self.rng,
                clock: &self.clock,
                config: &self.config,
                world: &self.world,
                regions: self.regions.as_ref(),
                factory: self.factory.as_ref(),
            };
            match system.process_entities(&view, &mut ctx) {
                Ok(count) => report.processed.push((system.name(), count)),
                Err(err) => {
                    tracing::error!(tick, system = system.name(), error = %err, "system failed");
                    report.failed.push((system.name(), err.to_string()));
                }
            }
        }

        report.commit = buffer.commit(&self.world);
        tracing::debug!(
            tick,
            applied = report.commit.applied,
            stale = report.commit.failures.len(),
            events = events.len(),
            "tick complete"
        );
        self.events.extend(events.iter().cloned());
        report.events = events;
        Ok(report)
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    // -- Commands ------------------------------------------------------------

    /// Queue a move for the next tick.
    pub fn request_move(&self, entity: EntityId, direction: Direction) -> SimResult<()> {
        commands::request_move(&self.world, entity, direction, self.clock.tick())
    }

    /// Queue an attack for the next tick.
    pub fn request_attack(&self, entity: EntityId, target: AttackTarget) -> SimResult<()> {
        commands::request_attack(&self.world, entity, target, self.clock.tick())
    }

    /// Queue a flee attempt for the next tick.
    pub fn request_flee(&self, entity: EntityId) -> SimResult<()> {
        commands::request_flee(&self.world, entity, self.clock.tick())
    }

    // -- Accessors -----------------------------------------------------------

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn regions(&self) -> &Arc<dyn RegionGenerator> {
        &self.regions
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}
