//! Force accumulation and semi-implicit Euler integration

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Particle;

/// Which force terms contribute to the net force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForceSet {
    pub gravity: bool,
    pub spring: bool,
    pub damping: bool,
    pub field: bool,
}

impl ForceSet {
    pub const NONE: Self = Self {
        gravity: false,
        spring: false,
        damping: false,
        field: false,
    };
}

/// Force constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceParams {
    /// Gravitational acceleration (force is mass * g)
    pub gravity: Vec2,
    /// Spring stiffness toward the target
    pub spring_k: f32,
    /// Linear damping coefficient
    pub damping_c: f32,
    /// Peak repulsion at zero distance from the curve
    pub field_strength: f32,
    /// Exponential falloff rate of the repulsion with distance
    pub field_falloff: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -1.0),
            spring_k: 4.0,
            damping_c: 0.5,
            field_strength: 1.0,
            field_falloff: 10.0,
        }
    }
}

/// Distance and outward direction from the nearest curve point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub distance: f32,
    /// Unit vector from the curve toward the particle
    pub normal: Vec2,
}

/// Per-particle external inputs for this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceEnv {
    /// Spring anchor (pointer position)
    pub target: Option<Vec2>,
    pub field: Option<FieldSample>,
}

/// Sum of the enabled force terms acting on `particle`.
/// Spring and field terms drop out when their input is missing.
pub fn net_force(particle: &Particle, params: &ForceParams, enabled: ForceSet, env: &ForceEnv) -> Vec2 {
    let mut force = Vec2::ZERO;

    if enabled.gravity {
        force += particle.mass * params.gravity;
    }
    if enabled.spring {
        if let Some(target) = env.target {
            force += -params.spring_k * (particle.position - target);
        }
    }
    if enabled.damping {
        force += -params.damping_c * particle.velocity;
    }
    if enabled.field {
        if let Some(sample) = env.field {
            force += params.field_strength * (-sample.distance * params.field_falloff).exp() * sample.normal;
        }
    }

    force
}

/// Advance one particle by `dt`: velocity first, then position from the new
/// velocity, then age.
pub fn step(particle: &mut Particle, params: &ForceParams, enabled: ForceSet, env: &ForceEnv, dt: f32) {
    let acceleration = net_force(particle, params, enabled, env) / particle.mass;
    particle.velocity += acceleration * dt;
    particle.position += particle.velocity * dt;
    particle.age += dt;
}
