//! Deterministic simulation module
//!
//! All kernel logic lives here. This module must be pure and deterministic:
//! - Externally supplied dt only, no internal clock
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering or platform dependencies

pub mod closest;
pub mod collision;
pub mod curve;
pub mod forces;
pub mod grid;
pub mod state;
pub mod tick;

pub use closest::{Projection, ProjectionParams, project, project_with};
pub use collision::{
    CollisionResult, Contact, Obstacle, resolve, segment_circle_intersection, segment_intersection,
};
pub use curve::Curve;
pub use forces::{FieldSample, ForceEnv, ForceParams, ForceSet, net_force, step};
pub use grid::SpatialGrid;
pub use state::{ColorProfile, Particle, RadiusProfile, Rect, RngState};
pub use tick::{ParticleSystem, TickInput, TickReport};
