//! Triangle geometry for thick lines and disks

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;
use crate::perp;

/// Quad covering the segment start-end with the given thickness, as two triangles.
///
/// The quad is built around the segment midpoint: half the segment along its
/// direction, half the thickness along its left normal.
pub fn line_quad(start: Vec2, end: Vec2, thickness: f32, color: [f32; 4]) -> [Vertex; 6] {
    let dir = (end - start).normalize_or_zero();
    let normal = perp(dir);
    let middle = (start + end) * 0.5;
    let half_len = (end - start) * 0.5;
    let half_thick = normal * thickness * 0.5;

    let corner = |along: f32, across: f32| Vertex::at(middle + along * half_len + across * half_thick, color);
    let v0 = corner(-1.0, -1.0);
    let v1 = corner(1.0, -1.0);
    let v2 = corner(1.0, 1.0);
    let v3 = corner(-1.0, 1.0);

    [v0, v1, v2, v0, v2, v3]
}

/// Thick line strip through `points` (one quad per span)
pub fn polyline_triangles(points: &[Vec2], thickness: f32, color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((points.len() - 1) * 6);
    for pair in points.windows(2) {
        vertices.extend_from_slice(&line_quad(pair[0], pair[1], thickness, color));
    }
    vertices
}

/// Filled circle as a triangle fan flattened to a list
pub fn disk(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::at(center, color));
        vertices.push(Vertex::at(center + radius * Vec2::new(theta1.cos(), theta1.sin()), color));
        vertices.push(Vertex::at(center + radius * Vec2::new(theta2.cos(), theta2.sin()), color));
    }

    vertices
}
