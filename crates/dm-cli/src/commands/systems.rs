use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use dm_simulation::ordering::resolve_order;
use dm_simulation::standard_systems;

pub fn run() -> Result<(), String> {
    let systems = standard_systems();
    let order = resolve_order(&systems).map_err(|e| format!("invalid system set: {e}"))?;

    println!("  {}", "System Execution Order".bold().underline());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "System", "Priority", "Depends on", "Writes"]);

    for (position, index) in order.into_iter().enumerate() {
        let system = &systems[index];
        let depends = if system.depends_on().is_empty() {
            "--".to_string()
        } else {
            system.depends_on().join(", ")
        };
        let writes: Vec<_> = system.writes().iter().map(|k| k.name()).collect();
        table.add_row(vec![
            (position + 1).to_string(),
            system.name().to_string(),
            system.priority().to_string(),
            depends,
            writes.join(", "),
        ]);
    }

    println!("{table}");
    Ok(())
}
