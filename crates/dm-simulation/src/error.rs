use dm_core::{ComponentKind, CoreError};
use dm_mechanics::MechError;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("system '{0}' is already registered")]
    DuplicateSystem(String),

    #[error("system '{system}' depends on unknown system '{dependency}'")]
    UnknownDependency { system: String, dependency: String },

    #[error("dependency cycle between systems: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("systems '{first}' and '{second}' both write {kind} with no ordering between them")]
    WriteConflict {
        first: String,
        second: String,
        kind: ComponentKind,
    },

    #[error("system '{system}' failed: {reason}")]
    SystemFailure { system: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Mechanics(#[from] MechError),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}
