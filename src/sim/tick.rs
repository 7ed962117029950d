//! Simulation tick
//!
//! One call to [`ParticleSystem::tick`] runs to completion:
//! integrate -> collide -> re-grid -> cull -> spawn.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use std::sync::Arc;

use super::closest::project_with;
use super::collision::{Obstacle, resolve};
use super::curve::Curve;
use super::forces::{FieldSample, ForceEnv, ForceParams, step};
use super::grid::SpatialGrid;
use super::state::{Particle, Rect, RngState};
use crate::error::Result;
use crate::renderer::{DrawList, colors};
use crate::settings::{Settings, SpawnPolicy};

/// External inputs for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer / spring target
    pub target: Option<Vec2>,
    /// Replacement curve control points for this tick
    pub curve_points: Option<Vec<Vec2>>,
    /// New domain bounds (window resize)
    pub bounds: Option<Rect>,
}

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: u32,
    pub expired: u32,
    pub out_of_bounds: u32,
    pub collisions: u32,
    /// New particles abandoned after exhausting their placement retries
    pub spawn_skipped: u32,
}

/// Owns the particle pool and its spatial grid
#[derive(Debug)]
pub struct ParticleSystem {
    settings: Settings,
    forces: ForceParams,
    particles: Vec<Particle>,
    grid: SpatialGrid,
    obstacles: Arc<[Obstacle]>,
    curve: Option<Curve>,
    target: Option<Vec2>,
    bounds: Rect,
    rng: Pcg32,
    time_ticks: u64,
}

impl ParticleSystem {
    /// Validate `settings` and build an empty system
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let curve = settings.initial_curve()?;
        let grid = SpatialGrid::new(settings.bounds, settings.min_separation)?;
        let obstacles: Arc<[Obstacle]> = settings.obstacles.clone().into();

        log::info!(
            "Particle system: max {} particles, separation {}, {} obstacles, curve degree {:?}",
            settings.max_particles,
            settings.min_separation,
            obstacles.len(),
            curve.as_ref().map(Curve::degree)
        );

        Ok(Self {
            forces: settings.force_params(),
            particles: Vec::with_capacity(settings.max_particles),
            grid,
            obstacles,
            curve,
            target: None,
            bounds: settings.bounds,
            rng: RngState::new(settings.seed).to_rng(),
            time_ticks: 0,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn curve(&self) -> Option<&Curve> {
        self.curve.as_ref()
    }

    /// Shared, read-only obstacle list
    pub fn obstacles(&self) -> Arc<[Obstacle]> {
        Arc::clone(&self.obstacles)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    fn positions(&self) -> Vec<Vec2> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        if !dt.is_finite() || dt <= 0.0 {
            log::debug!("Skipping tick with dt = {}", dt);
            return report;
        }

        self.apply_input(input);
        self.time_ticks += 1;

        self.integrate(dt, &mut report);
        self.cull(&mut report);
        self.spawn(&mut report);

        debug_assert!(self.particles.len() <= self.settings.max_particles);
        debug_assert!(self.grid.is_consistent(&self.positions()));

        if report != TickReport::default() {
            log::debug!(
                "Tick {}: {} alive, +{} spawned, -{} expired, -{} out, {} hits, {} skipped",
                self.time_ticks,
                self.particles.len(),
                report.spawned,
                report.expired,
                report.out_of_bounds,
                report.collisions,
                report.spawn_skipped
            );
        }
        report
    }

    fn apply_input(&mut self, input: &TickInput) {
        self.target = input.target;

        if let Some(points) = &input.curve_points {
            match Curve::new(points) {
                Ok(curve) => self.curve = Some(curve),
                Err(err) => log::warn!("Ignoring curve input: {}", err),
            }
        } else if let (Some(curve), Some(index), Some(target)) =
            (self.curve, self.settings.pointer_control_point, input.target)
        {
            self.curve = Some(curve.with_control_point(index, target));
        }

        if let Some(bounds) = input.bounds {
            if bounds != self.bounds {
                match self.grid.reconfigure(bounds, self.settings.min_separation) {
                    Ok(()) => {
                        self.bounds = bounds;
                        let positions = self.positions();
                        self.grid.rebuild(&positions);
                        log::info!("Bounds changed to {:?} .. {:?}", bounds.min, bounds.max);
                    }
                    Err(err) => {
                        log::warn!("Ignoring bounds input: {}", err);
                        let positions = self.positions();
                        self.grid.rebuild(&positions);
                    }
                }
            }
        }
    }

    /// Field sample for a particle: distance to the curve and the curve
    /// normal oriented toward the particle
    fn field_sample(&self, position: Vec2) -> Option<FieldSample> {
        let curve = self.curve.as_ref()?;
        let projection = project_with(curve, position, &self.settings.projection);
        let away = position - projection.point;
        let mut normal = curve.normal(projection.t);
        if normal == Vec2::ZERO {
            normal = away.normalize_or_zero();
        } else if normal.dot(away) < 0.0 {
            normal = -normal;
        }
        Some(FieldSample {
            distance: projection.distance,
            normal,
        })
    }

    fn integrate(&mut self, dt: f32, report: &mut TickReport) {
        let enabled = self.settings.forces;
        let collide = self.settings.collisions;

        for i in 0..self.particles.len() {
            let position = self.particles[i].position;
            let env = ForceEnv {
                target: self.target,
                field: if enabled.field {
                    self.field_sample(position)
                } else {
                    None
                },
            };

            let particle = &mut self.particles[i];
            let old = particle.position;
            step(particle, &self.forces, enabled, &env, dt);

            if !particle.position.is_finite() || !particle.velocity.is_finite() {
                // Degenerate numbers: leave the particle where it was this tick
                particle.position = old;
                particle.velocity = Vec2::ZERO;
            } else if collide {
                let result = resolve(old, particle.position, particle.velocity, dt, &self.obstacles);
                if result.hit {
                    particle.position = result.position;
                    particle.velocity = result.velocity;
                    report.collisions += 1;
                }
            }

            let position = self.particles[i].position;
            self.grid.relocate(i, position);
        }
    }

    /// Remove expired and escaped particles from the pool and the grid
    fn cull(&mut self, report: &mut TickReport) {
        let mut i = 0;
        while i < self.particles.len() {
            let particle = &self.particles[i];
            let expired = particle.is_expired();
            let escaped = !self.bounds.contains(particle.position);
            if expired || escaped {
                if expired {
                    report.expired += 1;
                } else {
                    report.out_of_bounds += 1;
                }
                self.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Swap-remove slot `index` from the pool, keeping the grid in step
    fn remove(&mut self, index: usize) -> Particle {
        let last = self.particles.len() - 1;
        self.grid.swap_remove(index, last);
        self.particles.swap_remove(index)
    }

    fn spawn(&mut self, report: &mut TickReport) {
        let room = self.settings.max_particles.saturating_sub(self.particles.len());
        let wanted = (self.settings.spawn_per_tick as usize).min(room);
        if wanted == 0 {
            return;
        }

        let mut positions = self.positions();
        for _ in 0..wanted {
            match self.find_spawn_position(&positions) {
                Some(position) => {
                    let particle = self.new_particle(position);
                    self.grid.insert(self.particles.len(), position);
                    self.particles.push(particle);
                    positions.push(position);
                    report.spawned += 1;
                }
                None => report.spawn_skipped += 1,
            }
        }
    }

    /// Dart-throw inside the spawn region until a spot clears the separation test
    fn find_spawn_position(&mut self, positions: &[Vec2]) -> Option<Vec2> {
        for attempt in 0..self.settings.spawn_attempts {
            let candidate = self.sample_position();
            if !self.bounds.contains(candidate) {
                continue;
            }
            if self.grid.is_clear(candidate, positions) {
                return Some(candidate);
            }
            log::trace!("Spawn attempt {} rejected at {:?}", attempt, candidate);
        }
        None
    }

    fn sample_position(&mut self) -> Vec2 {
        match (self.settings.spawn, self.curve) {
            (SpawnPolicy::OnCurve, Some(curve)) => curve.evaluate(self.rng.random_range(0.0..=1.0)),
            _ => {
                let area = self.settings.spawn_area.unwrap_or(self.bounds);
                Vec2::new(
                    self.rng.random_range(area.min.x..=area.max.x),
                    self.rng.random_range(area.min.y..=area.max.y),
                )
            }
        }
    }

    fn new_particle(&mut self, position: Vec2) -> Particle {
        let s = &self.settings;
        let velocity = Vec2::new(
            self.rng.random_range(s.velocity_min.x..=s.velocity_max.x),
            self.rng.random_range(s.velocity_min.y..=s.velocity_max.y),
        );
        let mass = self.rng.random_range(s.mass_range[0]..=s.mass_range[1]);
        let lifetime = self.rng.random_range(s.lifetime_range[0]..=s.lifetime_range[1]);

        let mut particle = Particle::new(position, velocity, mass, lifetime);
        particle.radius_profile = s.radius_profile;
        particle.color_profile = s.color_profile;
        particle
    }

    /// Everything an external renderer needs for this frame
    pub fn draw_list(&self) -> DrawList {
        let segments = self.settings.polyline_segments;
        let mut draw = DrawList::from_particles(&self.particles);

        for obstacle in self.obstacles.iter() {
            draw.push_polyline(obstacle.polyline(segments), colors::OBSTACLE);
        }
        if let Some(curve) = &self.curve {
            // A straight segment needs a single span
            let spans = if curve.degree() == 1 { 1 } else { segments };
            draw.push_polyline(curve.polyline(spans), colors::CURVE);
            draw.push_polyline(curve.control_points().to_vec(), colors::CONTROL_POLYGON);
            for &point in curve.control_points() {
                draw.push_marker(point, colors::CONTROL_POINT);
            }
        }
        draw.push_polyline(self.bounds.outline(), colors::BOUNDS);
        draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Preset;
    use crate::sim::ForceSet;

    fn still_settings() -> Settings {
        Settings {
            bounds: Rect::new(Vec2::splat(-1.0), Vec2::splat(1.0)),
            max_particles: 50,
            spawn_per_tick: 10,
            forces: ForceSet::NONE,
            velocity_min: Vec2::ZERO,
            velocity_max: Vec2::ZERO,
            lifetime_range: [100.0, 100.0],
            ..Settings::from_preset(Preset::BlueNoise)
        }
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let settings = Settings {
            min_separation: 0.0,
            ..Settings::default()
        };
        assert!(ParticleSystem::new(settings).is_err());
    }

    #[test]
    fn test_spawn_fills_to_capacity() {
        let mut sys = ParticleSystem::new(still_settings()).unwrap();
        for _ in 0..10 {
            sys.tick(&TickInput::default(), 0.016);
        }
        assert_eq!(sys.len(), 50);
        assert!(sys.grid().is_consistent(&sys.positions()));
    }

    #[test]
    fn test_non_positive_dt_skips_tick() {
        let mut sys = ParticleSystem::new(still_settings()).unwrap();
        let report = sys.tick(&TickInput::default(), 0.0);
        assert_eq!(report, TickReport::default());
        assert_eq!(sys.time_ticks(), 0);
        sys.tick(&TickInput::default(), f32::NAN);
        assert!(sys.is_empty());
    }

    #[test]
    fn test_expired_particles_are_culled_before_spawn() {
        let settings = Settings {
            lifetime_range: [0.01, 0.01],
            spawn_per_tick: 5,
            ..still_settings()
        };
        let mut sys = ParticleSystem::new(settings).unwrap();
        sys.tick(&TickInput::default(), 0.016);
        assert_eq!(sys.len(), 5);

        let report = sys.tick(&TickInput::default(), 0.016);
        assert_eq!(report.expired, 5);
        assert_eq!(report.spawned, 5);
        assert_eq!(sys.len(), 5);
        assert!(sys.particles().iter().all(|p| p.age == 0.0));
        assert!(sys.grid().is_consistent(&sys.positions()));
    }

    #[test]
    fn test_out_of_bounds_particles_are_culled() {
        let settings = Settings {
            velocity_min: Vec2::new(100.0, 0.0),
            velocity_max: Vec2::new(100.0, 0.0),
            spawn_per_tick: 3,
            ..still_settings()
        };
        let mut sys = ParticleSystem::new(settings).unwrap();
        sys.tick(&TickInput::default(), 0.016);
        assert_eq!(sys.len(), 3);

        let report = sys.tick(&TickInput::default(), 0.1);
        assert_eq!(report.out_of_bounds, 3);
        assert!(sys.grid().is_consistent(&sys.positions()));
    }

    #[test]
    fn test_crowded_spawns_are_skipped_not_fatal() {
        let settings = Settings {
            spawn_area: Some(Rect::new(Vec2::ZERO, Vec2::splat(0.01))),
            spawn_per_tick: 5,
            ..still_settings()
        };
        let mut sys = ParticleSystem::new(settings).unwrap();
        let report = sys.tick(&TickInput::default(), 0.016);
        assert_eq!(report.spawned, 1);
        assert_eq!(report.spawn_skipped, 4);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sys = ParticleSystem::new(Settings::from_preset(Preset::Rain)).unwrap();
            for _ in 0..120 {
                sys.tick(&TickInput::default(), 1.0 / 60.0);
            }
            sys.particles().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_pointer_drives_control_point() {
        let mut sys = ParticleSystem::new(Settings::from_preset(Preset::CurveField)).unwrap();
        let input = TickInput {
            target: Some(Vec2::new(0.7, -0.3)),
            ..Default::default()
        };
        sys.tick(&input, 0.016);
        assert_eq!(sys.curve().unwrap().control_points()[2], Vec2::new(0.7, -0.3));
    }

    #[test]
    fn test_curve_input_replaces_curve() {
        let mut sys = ParticleSystem::new(Settings::from_preset(Preset::CurveField)).unwrap();
        let input = TickInput {
            curve_points: Some(vec![Vec2::ZERO, Vec2::ONE]),
            ..Default::default()
        };
        sys.tick(&input, 0.016);
        assert_eq!(sys.curve().unwrap().degree(), 1);

        // Bad degree is ignored, previous curve stays
        let input = TickInput {
            curve_points: Some(vec![Vec2::ZERO]),
            ..Default::default()
        };
        sys.tick(&input, 0.016);
        assert_eq!(sys.curve().unwrap().degree(), 1);
    }

    #[test]
    fn test_on_curve_spawns_lie_on_curve() {
        let settings = Settings {
            spawn: SpawnPolicy::OnCurve,
            curve: Some(vec![Vec2::new(-0.8, 0.0), Vec2::new(0.8, 0.0)]),
            ..still_settings()
        };
        let mut sys = ParticleSystem::new(settings).unwrap();
        sys.tick(&TickInput::default(), 0.016);
        assert!(!sys.is_empty());
        for p in sys.particles() {
            assert!(p.position.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_bounds_change_rebuilds_grid() {
        let mut sys = ParticleSystem::new(still_settings()).unwrap();
        sys.tick(&TickInput::default(), 0.016);
        let input = TickInput {
            bounds: Some(Rect::new(Vec2::splat(-2.0), Vec2::splat(2.0))),
            ..Default::default()
        };
        sys.tick(&input, 0.016);
        assert_eq!(sys.bounds().max, Vec2::splat(2.0));
        assert_eq!(sys.grid().domain().max, Vec2::splat(2.0));
        assert!(sys.grid().is_consistent(&sys.positions()));
    }

    #[test]
    fn test_field_pushes_particles_off_curve() {
        let settings = Settings {
            curve: Some(vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)]),
            forces: ForceSet {
                field: true,
                ..ForceSet::NONE
            },
            ..still_settings()
        };
        let sys = ParticleSystem::new(settings).unwrap();
        let above = sys.field_sample(Vec2::new(0.0, 0.2)).unwrap();
        let below = sys.field_sample(Vec2::new(0.0, -0.2)).unwrap();
        assert!(above.normal.y > 0.99);
        assert!(below.normal.y < -0.99);
        assert!((above.distance - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_draw_list_covers_scene() {
        let mut sys = ParticleSystem::new(Settings::from_preset(Preset::CurveField)).unwrap();
        sys.tick(&TickInput::default(), 0.016);
        let draw = sys.draw_list();
        assert_eq!(draw.particles.len(), sys.len());
        // curve + control polygon + domain outline
        assert_eq!(draw.polylines.len(), 3);
        assert_eq!(draw.polylines[0].points.len(), 101);
        assert_eq!(draw.markers.len(), 4);
        let outline = draw.polylines.last().unwrap();
        assert_eq!(outline.color, colors::BOUNDS);
        assert_eq!(outline.points, sys.bounds().outline());
    }
}
