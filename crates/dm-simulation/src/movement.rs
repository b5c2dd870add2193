//! Movement: consumes movement requests and relocates entities.

use dm_core::{
    Combat, CombatState, ComponentKind, ComponentSet, Direction, EntityId, EntityKind, Exit,
    ExitTarget, Location, MovementRequest, Position, RegionId, Room, Stats,
};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::region::GenerationRequest;
use crate::system::{System, SystemView};

pub const NAME: &str = "movement";

pub(crate) const LEADS_NOWHERE: &str = "That way leads nowhere.";
pub(crate) const SHROUDED: &str = "The path ahead is shrouded in mist.";

/// Where a resolved exit leads.
#[derive(Debug, Clone)]
pub(crate) struct Destination {
    pub room: EntityId,
    pub data: Room,
    /// Region being left by this move, if any.
    pub left_region: Option<RegionId>,
}

fn region_left(from: &Room, entering: Option<&RegionId>) -> Option<RegionId> {
    match &from.region {
        Some(region) if Some(region) != entering => Some(region.clone()),
        _ => None,
    }
}

/// Resolve the room behind `exit`, generating dynamic-region rooms on
/// demand. The error is the player-facing denial.
pub(crate) fn resolve_destination(
    ctx: &mut TickContext<'_>,
    entity: EntityId,
    from_id: EntityId,
    from: &Room,
    direction: Direction,
    exit: &Exit,
) -> Result<Destination, String> {
    match &exit.target {
        ExitTarget::Room { room } => {
            let data = ctx
                .snapshot()
                .get::<Room>(*room)
                .cloned()
                .ok_or_else(|| LEADS_NOWHERE.to_string())?;
            Ok(Destination {
                room: *room,
                left_region: region_left(from, data.region.as_ref()),
                data,
            })
        }
        ExitTarget::Region { region, coordinate } => {
            let request = GenerationRequest {
                region: region.clone(),
                coordinate: *coordinate,
                direction: Some(direction),
                from_room: Some(from_id),
                from_region: from.region.clone(),
                entity,
            };
            let generated = match ctx.regions.get_or_generate(ctx.world, &request) {
                Ok(generated) => generated,
                Err(err) => {
                    tracing::warn!(entity = %entity, error = %err, "region generation failed");
                    return Err(SHROUDED.to_string());
                }
            };
            if generated.created {
                ctx.emit_in(
                    Some(generated.id),
                    SimEventKind::RegionGenerated {
                        region: region.clone(),
                        coordinate: *coordinate,
                        room: generated.id,
                    },
                    format!("{} takes shape out of the mist.", generated.room.name),
                );
            }
            Ok(Destination {
                room: generated.id,
                left_region: region_left(from, Some(region)),
                data: generated.room,
            })
        }
        ExitTarget::RegionExit { room_name } => {
            let room = EntityId::named(EntityKind::Room, room_name);
            let data = ctx
                .snapshot()
                .get::<Room>(room)
                .cloned()
                .ok_or_else(|| LEADS_NOWHERE.to_string())?;
            Ok(Destination {
                room,
                left_region: from.region.clone(),
                data,
            })
        }
    }
}

/// Stage the effect of a move: location update, stamina cost, events.
pub(crate) fn apply_move(
    ctx: &mut TickContext<'_>,
    entity: EntityId,
    location: &Location,
    direction: Direction,
    destination: &Destination,
    stamina_cost: i32,
) {
    let now = ctx.tick();
    let name = ctx.name_of(entity);

    ctx.buffer
        .write(entity, location.moved_to(destination.room, now));
    if stamina_cost > 0 {
        ctx.buffer
            .mutate::<Stats, _>(entity, |stats| stats.spend_stamina(stamina_cost));
    }

    ctx.emit_in(
        Some(location.room),
        SimEventKind::Left {
            entity,
            from: location.room,
            direction,
        },
        format!("{name} leaves {direction}."),
    );
    if let Some(region) = &destination.left_region {
        ctx.emit_in(
            Some(location.room),
            SimEventKind::LeftRegion {
                entity,
                region: region.clone(),
            },
            format!("{name} leaves {region}."),
        );
    }
    ctx.emit_in(
        Some(destination.room),
        SimEventKind::Entered {
            entity,
            to: destination.room,
            direction,
        },
        format!("{name} arrives in {}.", destination.data.name),
    );
}

/// Moves entities that carry a [`MovementRequest`].
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }

    fn try_move(
        &self,
        ctx: &mut TickContext<'_>,
        id: EntityId,
        request: &MovementRequest,
        location: &Location,
    ) -> Result<(), String> {
        let direction = request.direction;
        if ctx.clock.since(request.issued_at) > ctx.config.request_ttl {
            return Err("You lose your bearings.".into());
        }

        let combat = ctx.read::<Combat>(id);
        let stats = ctx.read::<Stats>(id);
        let dead = combat.as_ref().is_some_and(Combat::is_dead)
            || stats.as_ref().is_some_and(|s| !s.is_alive());
        if dead {
            return Err("You can't move while dead.".into());
        }
        if combat
            .as_ref()
            .is_some_and(|c| c.in_combat() && c.state != CombatState::Fleeing)
        {
            return Err("You can't leave while in combat!".into());
        }
        if ctx.read::<Position>(id).is_some_and(|p| !p.is_standing()) {
            return Err("You need to stand up first.".into());
        }

        let room = ctx
            .snapshot()
            .get::<Room>(location.room)
            .cloned()
            .ok_or_else(|| "You are nowhere.".to_string())?;
        let exit = room
            .exit(direction)
            .cloned()
            .ok_or_else(|| format!("You can't go {direction}."))?;
        if let Some(door) = &exit.door {
            if door.locked {
                return Err(format!("The {} is locked.", door.name));
            }
            if door.closed {
                return Err(format!("The {} is closed.", door.name));
            }
        }

        let cost = ctx.config.movement.stamina_cost;
        if stats.as_ref().is_some_and(|s| s.stamina.current < cost) {
            return Err("You are too exhausted to move.".into());
        }

        let destination = resolve_destination(ctx, id, location.room, &room, direction, &exit)?;
        if id.is_mob() && destination.data.flags.no_mob {
            return Err("You can't go that way.".into());
        }

        apply_move(ctx, id, location, direction, &destination, cost);
        Ok(())
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Location, ComponentKind::MovementRequest])
    }

    fn optional(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Stats,
            ComponentKind::Combat,
            ComponentKind::Position,
        ])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Location,
            ComponentKind::Stats,
            ComponentKind::MovementRequest,
        ])
    }

    fn priority(&self) -> i32 {
        20
    }

    fn depends_on(&self) -> &[&'static str] {
        &[crate::combat::initiation::NAME]
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        let mut moved = 0;
        for &id in view.entities() {
            let (Some(request), Some(location)) = (
                view.get::<MovementRequest>(id).copied(),
                view.get::<Location>(id).copied(),
            ) else {
                continue;
            };
            ctx.buffer.delete::<MovementRequest>(id);
            match self.try_move(ctx, id, &request, &location) {
                Ok(()) => moved += 1,
                Err(reason) => ctx.emit(SimEventKind::MoveDenied { entity: id }, reason),
            }
        }
        Ok(moved)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{ProceduralRegions, RegionBounds, RegionDef};
    use crate::simulation::Simulation;
    use crate::test_support::*;
    use crate::SimConfig;
    use dm_core::{Door, RoomFlags, World, WorldCoordinate};
    use std::sync::Arc;

    fn sim(world: Arc<World>) -> Simulation {
        let mut sim = Simulation::new(world, SimConfig::default());
        sim.add_system(Idle(crate::combat::initiation::NAME)).unwrap();
        sim.add_system(MovementSystem::new()).unwrap();
        sim
    }

    #[test]
    fn moves_through_open_exit() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let shop = room(&world, "Shop");
        link(&world, square, Direction::East, shop);
        let hero = player(&world, "Ayla", square);

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::East).unwrap();
        let report = sim.tick().unwrap();

        let location = world.get::<Location>(hero).unwrap();
        assert_eq!(location.room, shop);
        assert_eq!(location.previous_room, Some(square));
        assert_eq!(location.entered_at, 1);
        assert_eq!(world.get::<Stats>(hero).unwrap().stamina.current, 19);
        assert!(!world.has::<MovementRequest>(hero));
        assert_eq!(labels(&report), vec!["left", "entered"]);
    }

    #[test]
    fn missing_exit_is_denied_and_request_consumed() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let hero = player(&world, "Ayla", square);

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::Up).unwrap();
        let report = sim.tick().unwrap();

        assert_eq!(denials(&report), vec!["You can't go up."]);
        assert!(!world.has::<MovementRequest>(hero));
        assert_eq!(world.get::<Location>(hero).unwrap().room, square);
    }

    #[test]
    fn doors_block_movement() {
        let world = Arc::new(World::new());
        let hall = room(&world, "Hall");
        let vault = room(&world, "Vault");
        let cellar = room(&world, "Cellar");
        world.mutate::<Room, _>(hall, |r| {
            r.exits.insert(
                Direction::North,
                Exit::to_room(vault).with_door(Door::locked("vault door")),
            );
            let mut closed = Door::new("trapdoor");
            closed.closed = true;
            r.exits
                .insert(Direction::Down, Exit::to_room(cellar).with_door(closed));
        });
        let hero = player(&world, "Ayla", hall);

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::North).unwrap();
        let locked = sim.tick().unwrap();
        sim.request_move(hero, Direction::Down).unwrap();
        let closed = sim.tick().unwrap();

        assert_eq!(denials(&locked), vec!["The vault door is locked."]);
        assert_eq!(denials(&closed), vec!["The trapdoor is closed."]);
    }

    #[test]
    fn engaged_entities_cannot_leave() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let shop = room(&world, "Shop");
        link(&world, square, Direction::East, shop);
        let hero = player(&world, "Ayla", square);
        let rat = mob(&world, "rat", square);
        world.mutate::<Combat, _>(hero, |c| c.set_target(rat));

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::East).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec!["You can't leave while in combat!"]);
    }

    #[test]
    fn sitting_and_exhausted_entities_cannot_move() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let shop = room(&world, "Shop");
        link(&world, square, Direction::East, shop);
        let sitter = player(&world, "Sitter", square);
        world.insert(sitter, Position::Sitting);
        let tired = player(&world, "Tired", square);
        world.mutate::<Stats, _>(tired, |s| s.stamina.current = 0);

        let mut sim = sim(world.clone());
        sim.request_move(sitter, Direction::East).unwrap();
        sim.request_move(tired, Direction::East).unwrap();
        let report = sim.tick().unwrap();

        let mut reasons = denials(&report);
        reasons.sort();
        assert_eq!(
            reasons,
            vec!["You are too exhausted to move.", "You need to stand up first."]
        );
    }

    #[test]
    fn stale_requests_are_discarded() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let shop = room(&world, "Shop");
        link(&world, square, Direction::East, shop);
        let hero = player(&world, "Ayla", square);

        let mut sim = Simulation::new(world.clone(), SimConfig::default().with_request_ttl(1));
        sim.add_system(Idle(crate::combat::initiation::NAME)).unwrap();
        sim.add_system(MovementSystem::new()).unwrap();
        sim.run(3).unwrap();
        crate::commands::request_move(&world, hero, Direction::East, 0).unwrap();
        let report = sim.tick().unwrap();

        assert_eq!(denials(&report), vec!["You lose your bearings."]);
        assert_eq!(world.get::<Location>(hero).unwrap().room, square);
    }

    #[test]
    fn mobs_cannot_enter_no_mob_rooms() {
        let world = Arc::new(World::new());
        let street = room(&world, "Street");
        let temple = room(&world, "Temple");
        world.mutate::<Room, _>(temple, |r| {
            r.flags = RoomFlags {
                no_mob: true,
                ..RoomFlags::default()
            }
        });
        link(&world, street, Direction::North, temple);
        let rat = mob(&world, "rat", street);

        let mut sim = sim(world.clone());
        sim.request_move(rat, Direction::North).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec!["You can't go that way."]);
    }

    #[test]
    fn dangling_exit_leads_nowhere() {
        let world = Arc::new(World::new());
        let square = room(&world, "Square");
        let ghost = dm_core::EntityId::named(EntityKind::Room, "Demolished");
        world.mutate::<Room, _>(square, |r| {
            r.exits.insert(Direction::South, Exit::to_room(ghost));
        });
        let hero = player(&world, "Ayla", square);

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::South).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec![LEADS_NOWHERE]);
    }

    #[test]
    fn entering_and_leaving_a_dynamic_region() {
        let world = Arc::new(World::new());
        let gate = room(&world, "Forest Gate");
        let region = RegionId::new("mistwood");
        world.mutate::<Room, _>(gate, |r| {
            r.exits.insert(
                Direction::East,
                Exit::to_region(region.clone(), WorldCoordinate::ORIGIN),
            );
        });
        let hero = player(&world, "Ayla", gate);
        let regions = ProceduralRegions::new().with_region(
            RegionDef::new("mistwood", "the Mistwood", RegionBounds::square(2))
                .with_exit(Direction::West, "Forest Gate")
                .with_exit_density(0.0),
        );

        let mut sim = sim(world.clone()).with_regions(Arc::new(regions));
        sim.request_move(hero, Direction::East).unwrap();
        let entered = sim.tick().unwrap();
        let inside = world.get::<Location>(hero).unwrap().room;
        assert_ne!(inside, gate);
        assert_eq!(world.get::<Room>(inside).unwrap().region, Some(region));
        assert!(labels(&entered).contains(&"region_generated"));

        sim.request_move(hero, Direction::West).unwrap();
        let left = sim.tick().unwrap();
        assert_eq!(world.get::<Location>(hero).unwrap().room, gate);
        assert!(labels(&left).contains(&"left_region"));
    }

    #[test]
    fn failed_generation_is_shrouded() {
        let world = Arc::new(World::new());
        let gate = room(&world, "Forest Gate");
        world.mutate::<Room, _>(gate, |r| {
            r.exits.insert(
                Direction::East,
                Exit::to_region(RegionId::new("nowhere"), WorldCoordinate::ORIGIN),
            );
        });
        let hero = player(&world, "Ayla", gate);

        let mut sim = sim(world.clone());
        sim.request_move(hero, Direction::East).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec![SHROUDED]);
    }
}
