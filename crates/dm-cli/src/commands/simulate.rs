use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use dm_core::{
    AttackTarget, Combat, ComponentKind, ComponentSet, EntityId, Identity, Location, Room, Stats,
    WorldSnapshot,
};
use dm_simulation::{SimEvent, SimEventKind, Simulation};

use super::demo::{self, Action};

pub struct SimulateArgs {
    pub ticks: u64,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub dump: Option<PathBuf>,
    pub verbose: bool,
}

pub fn run(args: &SimulateArgs) -> Result<(), String> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let demo = demo::build()?;
    let player = demo.player;
    let regions = Arc::clone(&demo.regions);

    let mut sim = Simulation::new(Arc::clone(&demo.world), config)
        .with_regions(demo.regions)
        .with_factory(demo.factory)
        .with_standard_systems()
        .map_err(|e| format!("simulation setup failed: {e}"))?;
    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;

    for _ in 0..args.ticks {
        let next = sim.current_tick() + 1;
        for (_, action) in demo::SCRIPT.iter().filter(|(tick, _)| *tick == next) {
            issue(&sim, player, *action).map_err(|e| format!("tick {next}: {e}"))?;
        }
        let report = sim
            .tick()
            .map_err(|e| format!("simulation error: {e}"))?;
        for (system, error) in &report.failed {
            tracing::warn!(tick = report.tick, system, %error, "system failed");
        }
    }

    let snapshot = sim.world().snapshot();

    // Header
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!("({} ticks, seed={seed})", args.ticks).dimmed()
    );
    println!(
        "  {} entities, {} events logged, {} region rooms generated",
        snapshot.len(),
        sim.events().len(),
        regions.generated_count()
    );
    println!();

    if args.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[tick {:>3}]", event.tick).dimmed();
            println!("  {tick_label} {}", colorize_event(event));
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    } else {
        let notable: Vec<_> = sim
            .events()
            .events()
            .iter()
            .filter(|e| is_notable(&e.kind))
            .collect();
        if !notable.is_empty() {
            println!("  {}", "Notable Events".bold().underline());
            for event in notable {
                println!("  {} {}", tag(&event.kind), event.message);
            }
            println!();
        }
    }

    println!("  {}", "Entity Status".bold().underline());
    println!();
    println!("{}", status_table(&snapshot));
    println!();

    if let Some(path) = &args.dump {
        let json = sim
            .world()
            .to_json()
            .map_err(|e| format!("cannot serialize world: {e}"))?;
        std::fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        println!("  World state written to {}", path.display());
    }

    Ok(())
}

fn issue(sim: &Simulation, player: EntityId, action: Action) -> Result<(), String> {
    let result = match action {
        Action::Move(direction) => sim.request_move(player, direction),
        Action::Attack(keyword) => {
            sim.request_attack(player, AttackTarget::Keyword(keyword.to_string()))
        }
        Action::Flee => sim.request_flee(player),
    };
    result.map_err(|e| e.to_string())
}

fn is_notable(kind: &SimEventKind) -> bool {
    matches!(
        kind,
        SimEventKind::MobDied { .. }
            | SimEventKind::PlayerDied { .. }
            | SimEventKind::ExperienceGained { .. }
            | SimEventKind::RegionGenerated { .. }
            | SimEventKind::FleeSucceeded { .. }
    )
}

fn tag(kind: &SimEventKind) -> colored::ColoredString {
    match kind {
        SimEventKind::MobDied { .. } | SimEventKind::PlayerDied { .. } => {
            "DEATH ".red().bold()
        }
        SimEventKind::ExperienceGained { .. } => "XP    ".green().bold(),
        SimEventKind::RegionGenerated { .. } => "REGION".cyan().bold(),
        _ => "FLEE  ".yellow().bold(),
    }
}

fn colorize_event(event: &SimEvent) -> colored::ColoredString {
    let message = event.message.as_str();
    match &event.kind {
        SimEventKind::MobDied { .. } | SimEventKind::PlayerDied { .. } => message.red().bold(),
        SimEventKind::AttackCritical { .. } | SimEventKind::Stunned { .. } => {
            message.magenta().bold()
        }
        SimEventKind::AttackHit { .. } => message.red(),
        SimEventKind::AttackMissed { .. } => message.dimmed(),
        SimEventKind::ExperienceGained { .. } | SimEventKind::Recovered { .. } => message.green(),
        SimEventKind::Left { .. }
        | SimEventKind::Entered { .. }
        | SimEventKind::LeftRegion { .. } => message.blue(),
        SimEventKind::RegionGenerated { .. } | SimEventKind::Respawned { .. } => message.cyan(),
        kind if kind.is_denial() => message.yellow(),
        _ => message.normal(),
    }
}

fn status_table(snapshot: &WorldSnapshot) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Entity", "Kind", "Room", "Health", "Stamina", "State", "XP",
    ]);

    let mut ids = snapshot.entities_matching(ComponentSet::of(&[ComponentKind::Stats]));
    // Players first, then mobs by name.
    ids.sort_by_key(|id| (!id.is_player(), name_of(snapshot, *id)));

    for id in ids {
        let Some(stats) = snapshot.get::<Stats>(id) else {
            continue;
        };
        let room = snapshot
            .get::<Location>(id)
            .and_then(|l| snapshot.get::<Room>(l.room))
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "--".to_string());
        let state = snapshot
            .get::<Combat>(id)
            .map(|c| c.state.to_string())
            .unwrap_or_else(|| "--".to_string());
        table.add_row(vec![
            name_of(snapshot, id),
            id.kind.to_string(),
            room,
            format!("{}/{}", stats.health.current, stats.health.max),
            format!("{}/{}", stats.stamina.current, stats.stamina.max),
            state,
            stats.experience.to_string(),
        ]);
    }
    table
}

fn name_of(snapshot: &WorldSnapshot, id: EntityId) -> String {
    snapshot
        .get::<Identity>(id)
        .map(|i| i.name.clone())
        .unwrap_or_else(|| id.to_string())
}
