//! Swept collision detection and response against static obstacles
//!
//! A particle's motion over one tick is the segment old -> new. That segment is
//! tested against each obstacle in list order; the first obstacle that reports
//! a contact is resolved with a single bounce. Later obstacles are not checked
//! that tick, and fast particles can still tunnel through thin geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::consts::{PARALLEL_EPSILON, REST_SPEED_SQ};
use crate::{perp, reflect};

/// A static obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Segment { start: Vec2, end: Vec2 },
    Circle { center: Vec2, radius: f32 },
}

/// Where and how a motion segment meets an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Vec2,
    /// Unit surface normal at `point`
    pub normal: Vec2,
}

impl Obstacle {
    pub fn segment(start: Vec2, end: Vec2) -> Self {
        Obstacle::Segment { start, end }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Obstacle::Circle { center, radius }
    }

    /// First contact of the motion segment p1 -> p2 with this obstacle
    pub fn intersect(&self, p1: Vec2, p2: Vec2) -> Option<Contact> {
        match *self {
            Obstacle::Segment { start, end } => {
                let point = segment_intersection(p1, p2, start, end)?;
                let normal = perp(end - start).normalize_or_zero();
                if normal == Vec2::ZERO {
                    return None;
                }
                Some(Contact { point, normal })
            }
            Obstacle::Circle { center, radius } => {
                let point = segment_circle_intersection(p1, p2, center, radius)?;
                let normal = (point - center).normalize_or_zero();
                if normal == Vec2::ZERO {
                    return None;
                }
                Some(Contact { point, normal })
            }
        }
    }

    /// Outline for display. Circles are closed loops of `segments` edges.
    pub fn polyline(&self, segments: usize) -> Vec<Vec2> {
        match *self {
            Obstacle::Segment { start, end } => vec![start, end],
            Obstacle::Circle { center, radius } => {
                let segments = segments.max(3);
                (0..=segments)
                    .map(|i| {
                        let theta = TAU * i as f32 / segments as f32;
                        center + radius * Vec2::new(theta.cos(), theta.sin())
                    })
                    .collect()
            }
        }
    }
}

/// Intersection point of segments p1-p2 and q1-q2.
///
/// Parallel and collinear pairs report no intersection.
pub fn segment_intersection(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let r = p2 - p1;
    let s = q2 - q1;

    let rxs = r.perp_dot(s);
    if rxs.abs() < PARALLEL_EPSILON {
        return None;
    }

    let qp = q1 - p1;
    let t = qp.perp_dot(s) / rxs;
    let u = qp.perp_dot(r) / rxs;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + t * r)
    } else {
        None
    }
}

/// First point where segment p1-p2 enters the circle.
///
/// Solves |p1 + t·d - center|² = radius² and prefers the smaller root in
/// [0, 1], falling back to the larger one (segment starting inside).
pub fn segment_circle_intersection(p1: Vec2, p2: Vec2, center: Vec2, radius: f32) -> Option<Vec2> {
    let d = p2 - p1;
    let f = p1 - center;

    let a = d.dot(d);
    if a < PARALLEL_EPSILON {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();

    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    if (0.0..=1.0).contains(&t1) {
        Some(p1 + t1 * d)
    } else if (0.0..=1.0).contains(&t2) {
        Some(p1 + t2 * d)
    } else {
        None
    }
}

/// Result of resolving one tick of motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    pub position: Vec2,
    pub velocity: Vec2,
    pub hit: bool,
}

impl CollisionResult {
    pub fn miss(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            hit: false,
        }
    }
}

/// Resolve the motion old -> new against `obstacles`.
///
/// On the first contact the velocity is reflected about the surface normal and
/// the particle travels the unused fraction of the step along the reflected
/// velocity, starting from the contact point.
pub fn resolve(
    old_position: Vec2,
    new_position: Vec2,
    velocity: Vec2,
    dt: f32,
    obstacles: &[Obstacle],
) -> CollisionResult {
    let travel = old_position.distance(new_position);
    if travel <= 0.0 || !travel.is_finite() {
        return CollisionResult::miss(new_position, velocity);
    }

    let Some(contact) = obstacles
        .iter()
        .find_map(|obstacle| obstacle.intersect(old_position, new_position))
    else {
        return CollisionResult::miss(new_position, velocity);
    };

    // At rest: stop on the surface, nothing to reflect
    if velocity.length_squared() < REST_SPEED_SQ {
        return CollisionResult {
            position: contact.point,
            velocity,
            hit: true,
        };
    }

    let remaining = (1.0 - old_position.distance(contact.point) / travel).clamp(0.0, 1.0);
    let reflected = reflect(velocity, contact.normal);

    CollisionResult {
        position: contact.point + remaining * reflected * dt,
        velocity: reflected,
        hit: true,
    }
}
