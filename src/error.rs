//! Error types.
//!
//! Configuration errors are caught when an ecosystem is built. Everything
//! else that can go wrong inside a tick is an internal invariant violation
//! and aborts the tick; callers are expected to treat it as fatal.

use crate::ecosystem::LifecycleState;
use crate::genomics::DnaId;
use crate::physics::ZeroVectorAngle;
use thiserror::Error;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be between 0 and 1, got {value}")]
    NotAProbability { name: &'static str, value: f64 },

    #[error("viscosity kick-in velocity {kick_in} exceeds max velocity {max_velocity}")]
    KickInAboveMaxVelocity { kick_in: f64, max_velocity: f64 },

    #[error("space cell size {cell_size} is smaller than max velocity {max_velocity}")]
    CellSmallerThanMaxVelocity { cell_size: f64, max_velocity: f64 },
}

/// Errors surfaced by the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("physics invariant violated: {0}")]
    Physics(#[from] ZeroVectorAngle),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("ecosystem is not running ({0:?})")]
    NotRunning(LifecycleState),

    #[error("dna {0} is not in the gene pool")]
    UnknownDna(DnaId),

    #[error("malformed dna: {0}")]
    MalformedDna(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
