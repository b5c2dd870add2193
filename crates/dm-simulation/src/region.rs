//! On-demand generation of coordinate-addressed dynamic regions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dm_core::{
    Direction, EntityId, EntityKind, Exit, RegionId, RespawnTable, Room, SpawnEntry, World,
    WorldCoordinate,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A request to resolve the room at a region coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub region: RegionId,
    pub coordinate: WorldCoordinate,
    /// Direction the triggering entity is travelling in.
    pub direction: Option<Direction>,
    /// Room the entity is coming from, and its region if it has one.
    pub from_room: Option<EntityId>,
    pub from_region: Option<RegionId>,
    pub entity: EntityId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRoom {
    pub id: EntityId,
    pub room: Room,
    /// False when the room already existed.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("unknown region '{0}'")]
    UnknownRegion(RegionId),

    #[error("coordinate {coordinate} is outside region '{region}'")]
    OutOfBounds {
        region: RegionId,
        coordinate: WorldCoordinate,
    },

    #[error("region generation failed: {0}")]
    Failed(String),
}

/// Resolves region coordinates to rooms, generating them on first visit.
///
/// Implementations must return the same room for every request naming the
/// same (region, coordinate), including concurrent ones, and never remap a
/// coordinate once it has a room.
pub trait RegionGenerator: Send + Sync + std::fmt::Debug {
    fn get_or_generate(
        &self,
        world: &World,
        request: &GenerationRequest,
    ) -> Result<GeneratedRoom, GenerationError>;
}

// ---------------------------------------------------------------------------
// Region definitions
// ---------------------------------------------------------------------------

/// Inclusive coordinate box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub min: WorldCoordinate,
    pub max: WorldCoordinate,
}

impl RegionBounds {
    pub fn new(min: WorldCoordinate, max: WorldCoordinate) -> Self {
        Self { min, max }
    }

    /// A flat square of `radius` around the origin.
    pub fn square(radius: i32) -> Self {
        Self {
            min: WorldCoordinate::new(-radius, -radius, 0),
            max: WorldCoordinate::new(radius, radius, 0),
        }
    }

    pub fn contains(&self, c: WorldCoordinate) -> bool {
        (self.min.x..=self.max.x).contains(&c.x)
            && (self.min.y..=self.max.y).contains(&c.y)
            && (self.min.z..=self.max.z).contains(&c.z)
    }
}

/// Where the entrance room of a region leads back out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionExitDef {
    pub direction: Direction,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionDef {
    pub id: RegionId,
    pub name: String,
    pub bounds: RegionBounds,
    pub seed: u64,
    pub entrance: WorldCoordinate,
    pub exit: Option<RegionExitDef>,
    /// Names drawn for generated rooms. Empty means every room uses `name`.
    pub room_names: Vec<String>,
    /// Chance that a generated room links to each in-bounds neighbour.
    pub exit_density: f64,
    /// Mob templates that may be stocked in generated rooms.
    pub mob_templates: Vec<String>,
    pub mob_chance: f64,
    pub respawn_interval: u64,
}

impl RegionDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bounds: RegionBounds) -> Self {
        Self {
            id: RegionId::new(id),
            name: name.into(),
            bounds,
            seed: 0,
            entrance: WorldCoordinate::ORIGIN,
            exit: None,
            room_names: Vec::new(),
            exit_density: 0.6,
            mob_templates: Vec::new(),
            mob_chance: 0.0,
            respawn_interval: 20,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_exit(mut self, direction: Direction, room_name: impl Into<String>) -> Self {
        self.exit = Some(RegionExitDef {
            direction,
            room_name: room_name.into(),
        });
        self
    }

    pub fn with_room_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.room_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exit_density(mut self, density: f64) -> Self {
        self.exit_density = density;
        self
    }

    pub fn with_mobs<I, S>(mut self, templates: I, chance: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mob_templates = templates.into_iter().map(Into::into).collect();
        self.mob_chance = chance;
        self
    }

    /// Stable id of the room at `coordinate`.
    pub fn room_id(&self, coordinate: WorldCoordinate) -> EntityId {
        let key = format!(
            "{}@{},{},{}",
            self.id, coordinate.x, coordinate.y, coordinate.z
        );
        EntityId::named(EntityKind::Room, &key)
    }

    /// Build the room at `coordinate`. Everything except the back exit
    /// depends only on the region seed and the coordinate.
    fn build_room(&self, coordinate: WorldCoordinate, request: &GenerationRequest) -> Room {
        let mut rng = StdRng::seed_from_u64(cell_seed(self.seed, coordinate));

        let name = if self.room_names.is_empty() {
            self.name.clone()
        } else {
            self.room_names[rng.random_range(0..self.room_names.len())].clone()
        };
        let mut room = Room::new(name);
        room.description = format!("Somewhere in {} at {coordinate}.", self.name);
        room.region = Some(self.id.clone());
        room.coordinate = Some(coordinate);

        let density = self.exit_density.clamp(0.0, 1.0);
        for direction in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            let linked = rng.random_bool(density);
            let neighbour = coordinate.step(direction);
            if linked && self.bounds.contains(neighbour) {
                room.exits
                    .insert(direction, Exit::to_region(self.id.clone(), neighbour));
            }
        }

        if coordinate == self.entrance {
            if let Some(exit) = &self.exit {
                room.exits
                    .insert(exit.direction, Exit::leaving_region(exit.room_name.clone()));
            }
        }

        if let Some(travelled) = request.direction {
            let back = travelled.opposite();
            let previous = coordinate.step(back);
            let back_exit = if request.from_region.as_ref() == Some(&self.id)
                && self.bounds.contains(previous)
            {
                Some(Exit::to_region(self.id.clone(), previous))
            } else {
                request.from_room.map(Exit::to_room)
            };
            if let Some(exit) = back_exit {
                room.exits.insert(back, exit);
            }
        }

        if !self.mob_templates.is_empty() && rng.random_bool(self.mob_chance.clamp(0.0, 1.0)) {
            let template = &self.mob_templates[rng.random_range(0..self.mob_templates.len())];
            room.respawn = RespawnTable {
                mobs: vec![SpawnEntry::new(template.clone(), 1)],
                items: Vec::new(),
                interval_ticks: self.respawn_interval,
                last_respawn: 0,
            };
        }

        room
    }
}

fn cell_seed(seed: u64, coordinate: WorldCoordinate) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    for v in [coordinate.x, coordinate.y, coordinate.z] {
        h = (h ^ (v as i64 as u64)).wrapping_mul(0x0100_0000_01B3);
        h ^= h >> 29;
    }
    h
}

// ---------------------------------------------------------------------------
// ProceduralRegions
// ---------------------------------------------------------------------------

/// Built-in [`RegionGenerator`] over a registry of [`RegionDef`]s.
#[derive(Debug, Default)]
pub struct ProceduralRegions {
    regions: HashMap<RegionId, RegionDef>,
    /// Held across lookup, generation and insertion.
    rooms: Mutex<HashMap<(RegionId, WorldCoordinate), EntityId>>,
    generated: AtomicU64,
}

impl ProceduralRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, def: RegionDef) -> Self {
        self.register(def);
        self
    }

    pub fn register(&mut self, def: RegionDef) {
        self.regions.insert(def.id.clone(), def);
    }

    pub fn region(&self, id: &RegionId) -> Option<&RegionDef> {
        self.regions.get(id)
    }

    pub fn room_at(&self, region: &RegionId, coordinate: WorldCoordinate) -> Option<EntityId> {
        self.rooms.lock().get(&(region.clone(), coordinate)).copied()
    }

    /// Number of rooms generated so far.
    pub fn generated_count(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }
}

impl RegionGenerator for ProceduralRegions {
    fn get_or_generate(
        &self,
        world: &World,
        request: &GenerationRequest,
    ) -> Result<GeneratedRoom, GenerationError> {
        let def = self
            .regions
            .get(&request.region)
            .ok_or_else(|| GenerationError::UnknownRegion(request.region.clone()))?;
        if !def.bounds.contains(request.coordinate) {
            return Err(GenerationError::OutOfBounds {
                region: request.region.clone(),
                coordinate: request.coordinate,
            });
        }

        let key = (request.region.clone(), request.coordinate);
        let mut rooms = self.rooms.lock();

        let id = rooms
            .get(&key)
            .copied()
            .unwrap_or_else(|| def.room_id(request.coordinate));
        // Already in the world, e.g. a resumed save or another generator
        // instance: adopt it unchanged.
        if let Some(room) = world.get::<Room>(id) {
            rooms.insert(key, id);
            return Ok(GeneratedRoom {
                id,
                room,
                created: false,
            });
        }

        let room = def.build_room(request.coordinate, request);
        world.insert(id, room.clone());
        rooms.insert(key, id);
        self.generated.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            region = %def.id,
            coordinate = %request.coordinate,
            room = %id,
            "generated region room"
        );

        Ok(GeneratedRoom {
            id,
            room,
            created: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn mistwood() -> RegionDef {
        RegionDef::new("mistwood", "the Mistwood", RegionBounds::square(3))
            .with_seed(1234)
            .with_exit(Direction::West, "Town Square")
            .with_room_names(["Misty Clearing", "Tangled Thicket", "Fog-Bound Path"])
    }

    fn request(coordinate: WorldCoordinate) -> GenerationRequest {
        GenerationRequest {
            region: RegionId::new("mistwood"),
            coordinate,
            direction: None,
            from_room: None,
            from_region: None,
            entity: EntityId::new(EntityKind::Player),
        }
    }

    #[test]
    fn generates_once_then_reuses() {
        let world = World::new();
        let regions = ProceduralRegions::new().with_region(mistwood());
        let first = regions
            .get_or_generate(&world, &request(WorldCoordinate::ORIGIN))
            .unwrap();
        let second = regions
            .get_or_generate(&world, &request(WorldCoordinate::ORIGIN))
            .unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(regions.generated_count(), 1);
        assert!(world.has::<Room>(first.id));
    }

    #[test]
    fn concurrent_requests_get_the_same_room() {
        let world = Arc::new(World::new());
        let regions = Arc::new(ProceduralRegions::new().with_region(mistwood()));
        let coordinate = WorldCoordinate::new(1, 2, 0);

        let ids: Vec<EntityId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let world = Arc::clone(&world);
                    let regions = Arc::clone(&regions);
                    s.spawn(move || {
                        regions
                            .get_or_generate(&world, &request(coordinate))
                            .map(|generated| generated.id)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(regions.generated_count(), 1);
        assert_eq!(
            regions.room_at(&RegionId::new("mistwood"), coordinate),
            Some(ids[0])
        );
    }

    #[test]
    fn unknown_region_and_out_of_bounds_fail() {
        let world = World::new();
        let regions = ProceduralRegions::new().with_region(mistwood());

        let mut unknown = request(WorldCoordinate::ORIGIN);
        unknown.region = RegionId::new("swamp");
        assert!(matches!(
            regions.get_or_generate(&world, &unknown),
            Err(GenerationError::UnknownRegion(_))
        ));

        let far = request(WorldCoordinate::new(9, 0, 0));
        assert!(matches!(
            regions.get_or_generate(&world, &far),
            Err(GenerationError::OutOfBounds { .. })
        ));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn contents_are_deterministic_per_seed_and_coordinate() {
        let coordinate = WorldCoordinate::new(-1, 1, 0);
        let a = ProceduralRegions::new().with_region(mistwood());
        let b = ProceduralRegions::new().with_region(mistwood());
        let room_a = a
            .get_or_generate(&World::new(), &request(coordinate))
            .unwrap();
        let room_b = b
            .get_or_generate(&World::new(), &request(coordinate))
            .unwrap();
        assert_eq!(room_a.id, room_b.id);
        assert_eq!(room_a.room, room_b.room);
    }

    #[test]
    fn generated_room_always_has_a_way_back() {
        let world = World::new();
        let regions = ProceduralRegions::new()
            .with_region(mistwood().with_exit_density(0.0));
        let from = WorldCoordinate::ORIGIN;
        let mut req = request(from.step(Direction::North));
        req.direction = Some(Direction::North);
        req.from_region = Some(RegionId::new("mistwood"));
        req.from_room = Some(mistwood().room_id(from));

        let generated = regions.get_or_generate(&world, &req).unwrap();
        let back = generated.room.exit(Direction::South).unwrap();
        assert_eq!(
            back.target,
            dm_core::ExitTarget::Region {
                region: RegionId::new("mistwood"),
                coordinate: from
            }
        );
    }

    #[test]
    fn entering_from_outside_links_back_to_origin_room() {
        let world = World::new();
        let regions = ProceduralRegions::new()
            .with_region(mistwood().with_exit_density(0.0));
        let town = EntityId::named(EntityKind::Room, "Town Square");
        let mut req = request(WorldCoordinate::new(1, 0, 0));
        req.direction = Some(Direction::East);
        req.from_room = Some(town);

        let generated = regions.get_or_generate(&world, &req).unwrap();
        let back = generated.room.exit(Direction::West).unwrap();
        assert_eq!(back.target, dm_core::ExitTarget::Room { room: town });
    }

    #[test]
    fn existing_room_is_adopted_not_rebuilt() {
        let world = World::new();
        let town = EntityId::named(EntityKind::Room, "Town Square");
        let coordinate = WorldCoordinate::new(1, 0, 0);
        let mut from_town = request(coordinate);
        from_town.direction = Some(Direction::East);
        from_town.from_room = Some(town);

        let first = ProceduralRegions::new()
            .with_region(mistwood().with_exit_density(0.0))
            .get_or_generate(&world, &from_town)
            .unwrap();
        world.mutate::<Room, _>(first.id, |r| r.respawn.last_respawn = 77);

        // A fresh generator, as after resuming a saved world.
        let resumed = ProceduralRegions::new().with_region(mistwood().with_exit_density(0.0));
        let mut from_north = request(coordinate);
        from_north.direction = Some(Direction::South);
        from_north.from_room = Some(EntityId::named(EntityKind::Room, "Elsewhere"));
        let again = resumed.get_or_generate(&world, &from_north).unwrap();

        assert!(!again.created);
        assert_eq!(again.id, first.id);
        assert_eq!(resumed.generated_count(), 0);
        assert_eq!(resumed.room_at(&RegionId::new("mistwood"), coordinate), Some(first.id));
        let room = world.get::<Room>(first.id).unwrap();
        assert_eq!(room.respawn.last_respawn, 77);
        assert_eq!(
            room.exit(Direction::West).map(|e| e.target.clone()),
            Some(dm_core::ExitTarget::Room { room: town })
        );
        assert!(room.exit(Direction::North).is_none());
    }

    #[test]
    fn entrance_room_leads_out_of_the_region() {
        let world = World::new();
        let regions = ProceduralRegions::new().with_region(mistwood());
        let entrance = regions
            .get_or_generate(&world, &request(WorldCoordinate::ORIGIN))
            .unwrap();
        let exit = entrance.room.exit(Direction::West).unwrap();
        assert_eq!(
            exit.target,
            dm_core::ExitTarget::RegionExit {
                room_name: "Town Square".into()
            }
        );
        assert_eq!(entrance.room.region, Some(RegionId::new("mistwood")));
    }
}
