//! Particle and domain types
//!
//! Everything the simulation needs to reproduce a run lives in plain serde
//! types; the RNG is rebuilt from its seed.

use glam::{Vec2, Vec4};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (simulation domain, spawn area)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle centered on the origin with the given aspect ratio and unit half-height
    pub fn from_aspect(aspect_ratio: f32) -> Self {
        Self::new(Vec2::new(-aspect_ratio, -1.0), Vec2::new(aspect_ratio, 1.0))
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Positive, finite extent on both axes
    pub fn is_valid(&self) -> bool {
        let size = self.size();
        (size * 2.0).is_finite() && size.x > 0.0 && size.y > 0.0
    }

    /// Inclusive containment
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closed outline, first corner repeated at the end
    pub fn outline(&self) -> Vec<Vec2> {
        vec![
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
            self.min,
        ]
    }
}

/// Radius as a function of normalized age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadiusProfile {
    Constant(f32),
    /// Linear from `start` at birth to `end` at expiry
    Linear { start: f32, end: f32 },
}

impl RadiusProfile {
    pub fn eval(&self, life: f32) -> f32 {
        let life = life.clamp(0.0, 1.0);
        match *self {
            RadiusProfile::Constant(r) => r,
            RadiusProfile::Linear { start, end } => start + (end - start) * life,
        }
    }
}

impl Default for RadiusProfile {
    fn default() -> Self {
        RadiusProfile::Linear {
            start: 0.02,
            end: 0.0,
        }
    }
}

/// RGBA color as a function of normalized age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColorProfile {
    Solid(Vec4),
    /// Linear blend from `from` to `to`
    Fade { from: Vec4, to: Vec4 },
}

impl ColorProfile {
    pub fn eval(&self, life: f32) -> Vec4 {
        let life = life.clamp(0.0, 1.0);
        match *self {
            ColorProfile::Solid(c) => c,
            ColorProfile::Fade { from, to } => from.lerp(to, life),
        }
    }
}

impl Default for ColorProfile {
    fn default() -> Self {
        ColorProfile::Fade {
            from: Vec4::new(1.0, 0.8, 0.3, 1.0),
            to: Vec4::new(0.9, 0.2, 0.1, 0.0),
        }
    }
}

/// A simulated particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Always > 0 (checked at configuration time)
    pub mass: f32,
    /// Seconds since spawn
    pub age: f32,
    /// Total lifespan in seconds
    pub lifetime: f32,
    pub radius_profile: RadiusProfile,
    pub color_profile: ColorProfile,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, mass: f32, lifetime: f32) -> Self {
        Self {
            position,
            velocity,
            mass,
            age: 0.0,
            lifetime,
            radius_profile: RadiusProfile::default(),
            color_profile: ColorProfile::default(),
        }
    }

    /// Normalized age in [0, 1]
    pub fn life_fraction(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self) -> bool {
        self.age > self.lifetime
    }

    pub fn radius(&self) -> f32 {
        self.radius_profile.eval(self.life_fraction())
    }

    pub fn color(&self) -> Vec4 {
        self.color_profile.eval(self.life_fraction())
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
