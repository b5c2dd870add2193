use crate::entity::EntityId;
use crate::kind::ComponentKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core data model and the world runtime.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity has no entry in the entity index.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but does not carry the requested component.
    #[error("entity {entity} has no {kind} component")]
    ComponentMissing {
        /// The entity that was queried.
        entity: EntityId,
        /// The component kind that was expected.
        kind: ComponentKind,
    },

    /// A direction name could not be parsed.
    #[error("unknown direction: \"{0}\"")]
    UnknownDirection(String),

    /// An entity kind name could not be parsed.
    #[error("unknown entity kind: \"{0}\"")]
    UnknownEntityKind(String),

    /// A component kind name could not be parsed.
    #[error("unknown component kind: \"{0}\"")]
    UnknownComponentKind(String),

    /// World records could not be (de)serialized.
    #[error("world serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
