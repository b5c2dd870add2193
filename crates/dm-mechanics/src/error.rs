//! Error types for the mechanics crate.

/// Errors that can occur during mechanics operations.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A dice expression such as `1d6+2` could not be parsed.
    #[error("invalid dice expression: \"{0}\"")]
    InvalidDiceExpr(String),
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
