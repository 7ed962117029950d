//! GPU-ready vertex and instance types

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

/// 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(p: Vec2, color: [f32; 4]) -> Self {
        Self::new(p.x, p.y, color)
    }
}

/// One particle disk: center, radius, color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn new(position: Vec2, radius: f32, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            radius,
            _pad: 0.0,
            color: color.to_array(),
        }
    }
}

/// Colors for scene elements
pub mod colors {
    pub const BOUNDS: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const OBSTACLE: [f32; 4] = [0.8, 0.8, 0.9, 1.0];
    pub const CURVE: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    pub const CONTROL_POLYGON: [f32; 4] = [1.0, 0.5, 0.2, 0.5];
    pub const CONTROL_POINT: [f32; 4] = [1.0, 0.5, 0.2, 1.0];
}
