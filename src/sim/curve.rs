//! Bezier curves of degree 1 to 3
//!
//! Evaluation uses the closed Bernstein form. The de Casteljau (repeated lerp)
//! form is kept alongside it as a reference evaluator.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::{lerp, perp};

/// A Bezier curve; the degree is implied by the variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Linear([Vec2; 2]),
    Quadratic([Vec2; 3]),
    Cubic([Vec2; 4]),
}

impl Curve {
    /// Build a curve from 2, 3 or 4 control points
    pub fn new(points: &[Vec2]) -> Result<Self> {
        match *points {
            [p0, p1] => Ok(Curve::Linear([p0, p1])),
            [p0, p1, p2] => Ok(Curve::Quadratic([p0, p1, p2])),
            [p0, p1, p2, p3] => Ok(Curve::Cubic([p0, p1, p2, p3])),
            _ => Err(ConfigError::CurveDegree(points.len())),
        }
    }

    pub fn degree(&self) -> usize {
        self.control_points().len() - 1
    }

    pub fn control_points(&self) -> &[Vec2] {
        match self {
            Curve::Linear(p) => p,
            Curve::Quadratic(p) => p,
            Curve::Cubic(p) => p,
        }
    }

    /// Copy of this curve with one control point moved.
    /// Out-of-range indices leave the curve unchanged.
    pub fn with_control_point(mut self, index: usize, point: Vec2) -> Self {
        let slot = match &mut self {
            Curve::Linear(p) => p.get_mut(index),
            Curve::Quadratic(p) => p.get_mut(index),
            Curve::Cubic(p) => p.get_mut(index),
        };
        if let Some(slot) = slot {
            *slot = point;
        }
        self
    }

    /// Point on the curve (Bernstein form). `t` outside [0, 1] extrapolates.
    pub fn evaluate(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        match *self {
            Curve::Linear([p0, p1]) => u * p0 + t * p1,
            Curve::Quadratic([p0, p1, p2]) => u * u * p0 + 2.0 * u * t * p1 + t * t * p2,
            Curve::Cubic([p0, p1, p2, p3]) => {
                u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
            }
        }
    }

    /// Point on the curve by repeated linear interpolation
    pub fn evaluate_casteljau(&self, t: f32) -> Vec2 {
        match *self {
            Curve::Linear([p0, p1]) => lerp(p0, p1, t),
            Curve::Quadratic([p0, p1, p2]) => lerp(lerp(p0, p1, t), lerp(p1, p2, t), t),
            Curve::Cubic([p0, p1, p2, p3]) => {
                let a = lerp(p0, p1, t);
                let b = lerp(p1, p2, t);
                let c = lerp(p2, p3, t);
                lerp(lerp(a, b, t), lerp(b, c, t), t)
            }
        }
    }

    /// Analytic first derivative dC/dt (unnormalized)
    pub fn derivative(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        match *self {
            Curve::Linear([p0, p1]) => p1 - p0,
            Curve::Quadratic([p0, p1, p2]) => 2.0 * u * (p1 - p0) + 2.0 * t * (p2 - p1),
            Curve::Cubic([p0, p1, p2, p3]) => {
                3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
            }
        }
    }

    /// Unit tangent, zero where the derivative vanishes
    pub fn tangent(&self, t: f32) -> Vec2 {
        self.derivative(t).normalize_or_zero()
    }

    /// Unit normal (tangent rotated 90° counter-clockwise)
    pub fn normal(&self, t: f32) -> Vec2 {
        perp(self.tangent(t))
    }

    /// Sample `segments + 1` points at uniform parameter steps (for rendering)
    pub fn polyline(&self, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.evaluate(i as f32 / segments as f32))
            .collect()
    }
}
