//! Session configuration and demo presets
//!
//! Settings are supplied once at session start and validated before the
//! simulation is built. JSON via serde is the interchange format.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::consts::{POLYLINE_SEGMENTS, SPAWN_ATTEMPTS};
use crate::error::{ConfigError, Result};
use crate::sim::{
    ColorProfile, Curve, ForceParams, ForceSet, Obstacle, ProjectionParams, RadiusProfile, Rect,
};

/// Demo variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// Particles fall under gravity and bounce off segments and circles
    #[default]
    Rain,
    /// Particles spawn on a pointer-driven cubic, spring toward the pointer and
    /// are pushed off the curve by its field
    CurveField,
    /// Static Poisson-disk fill, no motion
    BlueNoise,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Rain => "Rain",
            Preset::CurveField => "CurveField",
            Preset::BlueNoise => "BlueNoise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rain" => Some(Preset::Rain),
            "curve" | "curvefield" | "curve-field" => Some(Preset::CurveField),
            "bluenoise" | "blue-noise" | "poisson" => Some(Preset::BlueNoise),
            _ => None,
        }
    }
}

/// How new particles are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpawnPolicy {
    /// Uniform in the spawn area
    #[default]
    Uniform,
    /// At a uniformly random parameter on the current curve
    OnCurve,
}

/// Static session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// RNG seed (same seed + same inputs = same run)
    pub seed: u64,

    // === Pool ===
    pub max_particles: usize,
    /// New particles attempted per tick
    pub spawn_per_tick: u32,
    /// Placement retries per new particle
    pub spawn_attempts: u32,
    pub spawn: SpawnPolicy,
    /// Region for uniform spawns (defaults to `bounds`)
    pub spawn_area: Option<Rect>,

    // === Forces ===
    pub gravity: Vec2,
    pub spring_k: f32,
    pub damping_c: f32,
    pub field_strength: f32,
    pub field_falloff: f32,
    pub forces: ForceSet,

    // === Spawn ranges ===
    /// Minimum distance between a new particle and any live one
    pub min_separation: f32,
    /// [min, max] seconds
    pub lifetime_range: [f32; 2],
    pub mass_range: [f32; 2],
    pub velocity_min: Vec2,
    pub velocity_max: Vec2,

    // === Domain ===
    pub bounds: Rect,
    pub collisions: bool,
    pub obstacles: Vec<Obstacle>,
    /// Initial curve control points (2..=4)
    pub curve: Option<Vec<Vec2>>,
    /// Control point that follows the pointer each tick
    pub pointer_control_point: Option<usize>,

    // === Cosmetics ===
    pub radius_profile: RadiusProfile,
    pub color_profile: ColorProfile,
    pub polyline_segments: usize,

    pub projection: ProjectionParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl Settings {
    /// Shared defaults every preset starts from
    fn base() -> Self {
        let forces = ForceParams::default();
        Self {
            seed: 0x5eed,

            max_particles: 200,
            spawn_per_tick: 4,
            spawn_attempts: SPAWN_ATTEMPTS,
            spawn: SpawnPolicy::Uniform,
            spawn_area: None,

            gravity: forces.gravity,
            spring_k: forces.spring_k,
            damping_c: forces.damping_c,
            field_strength: forces.field_strength,
            field_falloff: forces.field_falloff,
            forces: ForceSet::NONE,

            min_separation: 0.05,
            lifetime_range: [2.0, 5.0],
            mass_range: [0.5, 2.0],
            velocity_min: Vec2::splat(-0.2),
            velocity_max: Vec2::splat(0.2),

            bounds: Rect::from_aspect(16.0 / 9.0),
            collisions: false,
            obstacles: Vec::new(),
            curve: None,
            pointer_control_point: None,

            radius_profile: RadiusProfile::default(),
            color_profile: ColorProfile::default(),
            polyline_segments: POLYLINE_SEGMENTS,

            projection: ProjectionParams::default(),
        }
    }

    /// Settings for a demo variant
    pub fn from_preset(preset: Preset) -> Self {
        let mut settings = Self::base();
        match preset {
            Preset::Rain => {
                settings.forces = ForceSet {
                    gravity: true,
                    damping: true,
                    ..ForceSet::NONE
                };
                settings.spawn_area = Some(Rect::new(Vec2::new(-1.6, 0.8), Vec2::new(1.6, 1.0)));
                settings.velocity_min = Vec2::new(-0.1, -0.2);
                settings.velocity_max = Vec2::new(0.1, 0.0);
                settings.collisions = true;
                settings.obstacles = vec![
                    Obstacle::segment(Vec2::new(-1.2, 0.2), Vec2::new(-0.2, -0.1)),
                    Obstacle::segment(Vec2::new(0.3, -0.3), Vec2::new(1.3, 0.1)),
                    Obstacle::circle(Vec2::new(0.0, 0.4), 0.2),
                    Obstacle::circle(Vec2::new(-0.8, -0.6), 0.15),
                ];
            }
            Preset::CurveField => {
                settings.forces = ForceSet {
                    spring: true,
                    damping: true,
                    field: true,
                    ..ForceSet::NONE
                };
                settings.spawn = SpawnPolicy::OnCurve;
                settings.spring_k = 0.5;
                settings.damping_c = 0.8;
                settings.field_strength = 2.0;
                settings.curve = Some(vec![
                    Vec2::new(-0.5, -0.5),
                    Vec2::new(-0.2, 0.5),
                    Vec2::new(0.2, 0.3),
                    Vec2::new(0.5, 0.5),
                ]);
                settings.pointer_control_point = Some(2);
                settings.color_profile = ColorProfile::Fade {
                    from: Vec4::new(0.3, 0.8, 1.0, 1.0),
                    to: Vec4::new(0.1, 0.2, 0.9, 0.0),
                };
            }
            Preset::BlueNoise => {
                settings.max_particles = 2000;
                settings.spawn_per_tick = 20;
                settings.min_separation = 0.04;
                settings.lifetime_range = [f32::MAX, f32::MAX];
                settings.mass_range = [1.0, 1.0];
                settings.velocity_min = Vec2::ZERO;
                settings.velocity_max = Vec2::ZERO;
                settings.radius_profile = RadiusProfile::Constant(0.01);
                settings.color_profile = ColorProfile::Solid(Vec4::ONE);
            }
        }
        settings
    }

    pub fn force_params(&self) -> ForceParams {
        ForceParams {
            gravity: self.gravity,
            spring_k: self.spring_k,
            damping_c: self.damping_c,
            field_strength: self.field_strength,
            field_falloff: self.field_falloff,
        }
    }

    /// Initial curve, if configured
    pub fn initial_curve(&self) -> Result<Option<Curve>> {
        self.curve.as_deref().map(Curve::new).transpose()
    }

    /// Reject configurations the kernel cannot run. No value is ever
    /// replaced by a default.
    pub fn validate(&self) -> Result<()> {
        if !self.min_separation.is_finite() || self.min_separation <= 0.0 {
            return Err(ConfigError::NonPositiveSeparation(self.min_separation));
        }
        let [mass_min, mass_max] = self.mass_range;
        if !(mass_min > 0.0 && mass_max > 0.0) || !sampleable_span(mass_min, mass_max) {
            return Err(ConfigError::NonPositiveMass {
                min: mass_min,
                max: mass_max,
            });
        }
        if mass_min > mass_max {
            return Err(ConfigError::InvalidParam(format!(
                "mass range has min > max: [{mass_min}, {mass_max}]"
            )));
        }
        let [life_min, life_max] = self.lifetime_range;
        if !sampleable_span(life_min, life_max) || life_min > life_max {
            return Err(ConfigError::LifetimeRange {
                min: life_min,
                max: life_max,
            });
        }
        if self.collisions && self.obstacles.is_empty() {
            return Err(ConfigError::EmptyObstacles);
        }
        for (name, rect) in [("bounds", Some(self.bounds)), ("spawn_area", self.spawn_area)] {
            if let Some(rect) = rect {
                if !rect.is_valid() {
                    return Err(ConfigError::InvalidBounds(format!(
                        "{name}: {:?} .. {:?}",
                        rect.min, rect.max
                    )));
                }
            }
        }
        if !sampleable_span(self.velocity_min.x, self.velocity_max.x)
            || !sampleable_span(self.velocity_min.y, self.velocity_max.y)
        {
            return Err(ConfigError::InvalidParam(format!(
                "velocity range must be finite: {} .. {}",
                self.velocity_min, self.velocity_max
            )));
        }
        if self.velocity_min.cmpgt(self.velocity_max).any() {
            return Err(ConfigError::InvalidParam(
                "velocity_min exceeds velocity_max".into(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::InvalidParam(format!("gravity must be finite: {}", self.gravity)));
        }
        for (name, value) in [
            ("spring_k", self.spring_k),
            ("damping_c", self.damping_c),
            ("field_strength", self.field_strength),
            ("field_falloff", self.field_falloff),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParam(format!("{name} must be finite: {value}")));
            }
        }
        if self.max_particles == 0 {
            return Err(ConfigError::InvalidParam("max_particles must be > 0".into()));
        }
        if self.projection.max_iterations == 0 || self.projection.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidParam(
                "projection needs a positive learning rate and iteration cap".into(),
            ));
        }
        if let Some(index) = self.pointer_control_point {
            let points = self.curve.as_ref().map_or(0, Vec::len);
            if index >= points {
                return Err(ConfigError::InvalidParam(format!(
                    "pointer_control_point {index} out of range for {points} control points"
                )));
            }
        }
        self.initial_curve()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Range the RNG can draw from: both ends finite and the width with headroom
fn sampleable_span(min: f32, max: f32) -> bool {
    ((max - min) * 2.0).is_finite()
}
