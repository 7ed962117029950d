//! Renderer boundary
//!
//! The kernel never talks to a graphics API. Each frame it hands out a
//! [`DrawList`]: one instance per particle plus polylines for obstacles and
//! curves. The helpers in [`shapes`] turn those into triangle lists.

pub mod shapes;
pub mod vertex;

use glam::{Vec2, Vec4};

use crate::consts::LINE_THICKNESS;
use crate::sim::Particle;
pub use vertex::{ParticleInstance, Vertex, colors};

const MARKER_RADIUS: f32 = 0.01;
const MARKER_SEGMENTS: u32 = 16;

/// An ordered run of points drawn as a thick line
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub color: [f32; 4],
    pub thickness: f32,
}

/// Everything to draw for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub particles: Vec<ParticleInstance>,
    pub polylines: Vec<Polyline>,
    /// Small disks marking curve control points
    pub markers: Vec<ParticleInstance>,
}

impl DrawList {
    pub fn from_particles(particles: &[Particle]) -> Self {
        Self {
            particles: particles
                .iter()
                .map(|p| ParticleInstance::new(p.position, p.radius(), p.color()))
                .collect(),
            polylines: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn push_polyline(&mut self, points: Vec<Vec2>, color: [f32; 4]) {
        self.polylines.push(Polyline {
            points,
            color,
            thickness: LINE_THICKNESS,
        });
    }

    pub fn push_marker(&mut self, position: Vec2, color: [f32; 4]) {
        self.markers
            .push(ParticleInstance::new(position, MARKER_RADIUS, Vec4::from_array(color)));
    }

    /// All polylines expanded into one triangle list
    pub fn line_vertices(&self) -> Vec<Vertex> {
        self.polylines
            .iter()
            .flat_map(|line| shapes::polyline_triangles(&line.points, line.thickness, line.color))
            .collect()
    }

    /// All markers expanded into one triangle list
    pub fn marker_vertices(&self) -> Vec<Vertex> {
        self.markers
            .iter()
            .flat_map(|m| shapes::disk(Vec2::from(m.position), m.radius, m.color, MARKER_SEGMENTS))
            .collect()
    }
}
