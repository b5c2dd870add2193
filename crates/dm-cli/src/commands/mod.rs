pub mod demo;
pub mod simulate;
pub mod systems;

use std::path::Path;

use dm_simulation::SimConfig;

/// Load a simulation config from a JSON file, or the defaults.
fn load_config(path: Option<&Path>) -> Result<SimConfig, String> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    SimConfig::from_json_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}
