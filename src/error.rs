//! Configuration errors
//!
//! Only session setup can fail. Per-particle numeric trouble inside a tick
//! degrades to "no hit" / "skip this particle" and never reaches here.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Fatal configuration problems reported at session start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A curve needs 2 to 4 control points (degree 1 to 3).
    #[error("curve needs 2..=4 control points (degree 1-3), got {0}")]
    CurveDegree(usize),

    #[error("mass range must be positive, got [{min}, {max}]")]
    NonPositiveMass { min: f32, max: f32 },

    #[error("minimum separation must be finite and > 0, got {0}")]
    NonPositiveSeparation(f32),

    #[error("collisions are enabled but the obstacle list is empty")]
    EmptyObstacles,

    #[error("lifetime range has min > max: [{min}, {max}]")]
    LifetimeRange { min: f32, max: f32 },

    /// Bounds must have positive, finite extent.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// Any other out-of-range setting.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
