//! Bezier Particles - a 2D geometric simulation kernel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (curves, forces, collisions, spatial grid)
//! - `renderer`: Data handed to an external renderer (no graphics API here)
//! - `settings`: Static session configuration and presets
//! - `error`: Configuration error taxonomy

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, Result};
pub use settings::{Preset, Settings, SpawnPolicy};

use glam::Vec2;

/// Kernel configuration constants
pub mod consts {
    /// Default frame delta for headless runs (60 Hz)
    pub const DEFAULT_DT: f32 = 1.0 / 60.0;

    /// Spawn retries per new particle before giving up for this tick
    pub const SPAWN_ATTEMPTS: u32 = 30;

    /// Segments used when sampling a curve for display
    pub const POLYLINE_SEGMENTS: usize = 100;

    /// Below this cross product two segments are treated as parallel
    pub const PARALLEL_EPSILON: f32 = 1e-8;

    /// Squared speed below which a particle is considered at rest
    pub const REST_SPEED_SQ: f32 = 1e-12;

    /// Step for central-difference derivatives
    pub const CENTRAL_DIFF_H: f32 = 1e-3;

    /// Line thickness for curves and obstacles (normalized device units)
    pub const LINE_THICKNESS: f32 = 0.005;
}

/// Left perpendicular `(-y, x)`
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Linear interpolation `(1 - t) * a + t * b`
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    (1.0 - t) * a + t * b
}

/// Reflect a vector about a unit normal: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    v - 2.0 * v.dot(normal) * normal
}

/// Component-wise tolerance equality
#[inline]
pub fn approx_eq(a: Vec2, b: Vec2, eps: f32) -> bool {
    (a - b).abs().max_element() <= eps
}
