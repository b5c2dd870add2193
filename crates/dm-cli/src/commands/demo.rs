//! The built-in demo world and the scripted player session.

use std::sync::Arc;

use dm_core::{
    Combat, Direction, Door, EntityId, EntityKind, Exit, Identity, Location, Position, RegionId,
    RespawnTable, Room, RoomFlags, SpawnEntry, Stats, World, WorldCoordinate,
};
use dm_simulation::{
    EntityFactory, ItemTemplate, MobTemplate, ProceduralRegions, RegionBounds, RegionDef,
    TemplateFactory,
};

pub const TOWN_SQUARE: &str = "Town Square";
pub const PLAYER: &str = "Ayla";

/// One scripted player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Attack(&'static str),
    Flee,
}

/// (tick the command runs on, command)
pub const SCRIPT: &[(u64, Action)] = &[
    (1, Action::Move(Direction::North)),
    (2, Action::Attack("aldous")),
    (3, Action::Move(Direction::South)),
    (4, Action::Move(Direction::West)),
    (5, Action::Move(Direction::Down)),
    (6, Action::Move(Direction::East)),
    (7, Action::Move(Direction::South)),
    (8, Action::Attack("goblin")),
    (14, Action::Attack("2.goblin")),
    (18, Action::Flee),
    (20, Action::Move(Direction::North)),
    (22, Action::Move(Direction::East)),
    (24, Action::Move(Direction::East)),
    (26, Action::Move(Direction::North)),
    (28, Action::Attack("wolf")),
    (33, Action::Flee),
    (35, Action::Move(Direction::South)),
    (37, Action::Move(Direction::West)),
    (39, Action::Move(Direction::West)),
];

/// Everything a simulation of the demo world needs.
#[derive(Debug)]
pub struct Demo {
    pub world: Arc<World>,
    pub regions: Arc<ProceduralRegions>,
    pub factory: Arc<TemplateFactory>,
    pub player: EntityId,
}

fn room_id(name: &str) -> EntityId {
    EntityId::named(EntityKind::Room, name)
}

fn factory() -> TemplateFactory {
    TemplateFactory::new()
        .with_mob(
            "goblin",
            MobTemplate::new(
                "a goblin",
                Stats::default().with_health(10).with_armor_class(11),
                "1d6",
            )
            .with_keywords(["goblin"]),
        )
        .with_mob(
            "wolf",
            MobTemplate::new(
                "a grey wolf",
                Stats::default()
                    .with_health(12)
                    .with_dexterity(14)
                    .with_level(2),
                "1d6+1",
            )
            .with_keywords(["wolf", "grey"]),
        )
        .with_item(
            "dagger",
            ItemTemplate::new("a rusty dagger").with_keywords(["dagger", "rusty"]),
        )
}

fn regions() -> ProceduralRegions {
    ProceduralRegions::new().with_region(
        RegionDef::new("mistwood", "the Mistwood", RegionBounds::square(4))
            .with_seed(7)
            .with_exit(Direction::West, TOWN_SQUARE)
            .with_room_names([
                "Misty Clearing",
                "Twisted Grove",
                "Fog Hollow",
                "Mossy Ravine",
            ])
            .with_mobs(["wolf"], 0.35),
    )
}

fn add_room(world: &World, room: Room) -> EntityId {
    let id = room_id(&room.name);
    world.insert(id, room);
    id
}

/// Build the demo world: a town square with a shop, a temple, a goblin
/// warren, and the Mistwood to the east.
pub fn build() -> Result<Demo, String> {
    let world = Arc::new(World::new());

    add_room(
        &world,
        Room::new(TOWN_SQUARE)
            .with_exit(Direction::North, Exit::to_room(room_id("Temple of Dawn")))
            .with_exit(Direction::West, Exit::to_room(room_id("Old Shop")))
            .with_exit(Direction::South, Exit::to_room(room_id("Goblin Warren")))
            .with_exit(
                Direction::East,
                Exit::to_region(RegionId::new("mistwood"), WorldCoordinate::ORIGIN),
            ),
    );
    add_room(
        &world,
        Room::new("Temple of Dawn")
            .with_flags(RoomFlags {
                safe: true,
                no_mob: true,
                no_recall: false,
            })
            .with_exit(Direction::South, Exit::to_room(room_id(TOWN_SQUARE))),
    );
    add_room(
        &world,
        Room::new("Old Shop")
            .with_exit(
                Direction::East,
                Exit::to_room(room_id(TOWN_SQUARE)).with_door(Door::new("shop door")),
            )
            .with_exit(
                Direction::Down,
                Exit::to_room(room_id("Cellar")).with_door(Door::locked("cellar hatch")),
            ),
    );
    add_room(
        &world,
        Room::new("Cellar").with_exit(Direction::Up, Exit::to_room(room_id("Old Shop"))),
    );
    let warren = add_room(
        &world,
        Room::new("Goblin Warren")
            .with_exit(Direction::North, Exit::to_room(room_id(TOWN_SQUARE)))
            .with_respawn(RespawnTable {
                mobs: vec![SpawnEntry::new("goblin", 2)],
                items: vec![SpawnEntry::new("dagger", 1)],
                interval_ticks: 15,
                last_respawn: 0,
            }),
    );

    let player = EntityId::named(EntityKind::Player, PLAYER);
    world.insert(player, Identity::new(PLAYER).with_keywords(["ayla"]));
    world.insert(
        player,
        Stats::default()
            .with_health(40)
            .with_attack(4, 1)
            .with_dexterity(14)
            .with_level(3),
    );
    world.insert(player, Combat::with_weapon("1d8+1"));
    world.insert(player, Position::Standing);
    world.insert(player, Location::new(room_id(TOWN_SQUARE), 0));

    let priest = EntityId::named(EntityKind::Mob, "Brother Aldous");
    world.insert(
        priest,
        Identity::new("Brother Aldous").with_keywords(["aldous", "priest"]),
    );
    world.insert(priest, Stats::default().with_health(30));
    world.insert(priest, Combat::default());
    world.insert(priest, Location::new(room_id("Temple of Dawn"), 0));

    let factory = factory();
    for template in ["goblin", "goblin"] {
        factory
            .spawn_mob(&world, template, warren, 0)
            .map_err(|e| format!("demo world: {e}"))?;
    }
    factory
        .spawn_item(&world, "dagger", warren, 0)
        .map_err(|e| format!("demo world: {e}"))?;

    Ok(Demo {
        world,
        regions: Arc::new(regions()),
        factory: Arc::new(factory),
        player,
    })
}
