//! Errors raised while assembling a movement system.

use voom_config::ConfigError;

/// Construction-time failures of [`MovementSystem`](crate::MovementSystem).
#[derive(Debug, thiserror::Error)]
pub enum MovementError {
    /// A required host handle was not supplied to the builder.
    #[error("missing host handle: {0}")]
    MissingHostHandle(&'static str),
    /// The movement tuning failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
