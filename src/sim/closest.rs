//! Closest point on a curve by gradient descent
//!
//! Minimizes f(t) = |C(t) - p|² over t in [0, 1], starting from a fixed guess.
//! For curves that come back near themselves there can be several local
//! minima; the solver returns whichever one the descent from `initial_t`
//! lands in.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::curve::Curve;
use crate::consts::CENTRAL_DIFF_H;

/// Gradient descent tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Fixed step size applied to df/dt
    pub learning_rate: f32,
    /// Iteration cap
    pub max_iterations: u32,
    /// Stop once |df/dt| falls below this
    pub tolerance: f32,
    /// Starting parameter
    pub initial_t: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            max_iterations: 100,
            tolerance: 1e-6,
            initial_t: 0.5,
        }
    }
}

/// Outcome of a projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Parameter of the closest point found, in [0, 1]
    pub t: f32,
    /// Curve point at `t`
    pub point: Vec2,
    /// Distance from the query point to `point`
    pub distance: f32,
    /// Descent steps taken
    pub iterations: u32,
}

/// Parameter of the (locally) closest curve point using default tuning
pub fn project(curve: &Curve, point: Vec2) -> f32 {
    project_with(curve, point, &ProjectionParams::default()).t
}

/// Project `point` onto `curve` with explicit tuning
pub fn project_with(curve: &Curve, point: Vec2, params: &ProjectionParams) -> Projection {
    descend(point, params, |t| curve.evaluate(t), |t| curve.derivative(t))
}

/// Project onto an arbitrary parametric function, using a central-difference
/// derivative since no analytic one is available
pub fn project_fn<F>(f: F, point: Vec2, params: &ProjectionParams) -> Projection
where
    F: Fn(f32) -> Vec2,
{
    descend(point, params, &f, |t| numeric_derivative(&f, t))
}

/// Central-difference estimate of dC/dt
pub fn numeric_derivative<F>(f: F, t: f32) -> Vec2
where
    F: Fn(f32) -> Vec2,
{
    let h = CENTRAL_DIFF_H;
    (f(t + h) - f(t - h)) / (2.0 * h)
}

fn descend<E, D>(point: Vec2, params: &ProjectionParams, eval: E, deriv: D) -> Projection
where
    E: Fn(f32) -> Vec2,
    D: Fn(f32) -> Vec2,
{
    let mut t = params.initial_t.clamp(0.0, 1.0);
    let mut iterations = 0;

    while iterations < params.max_iterations {
        // d/dt |C(t) - p|² = 2 (C(t) - p) · C'(t)
        let gradient = 2.0 * (eval(t) - point).dot(deriv(t));
        if !gradient.is_finite() || gradient.abs() < params.tolerance {
            break;
        }
        t = (t - params.learning_rate * gradient).clamp(0.0, 1.0);
        iterations += 1;
    }

    let closest = eval(t);
    Projection {
        t,
        point: closest,
        distance: closest.distance(point),
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic() -> Curve {
        Curve::Cubic([
            Vec2::new(-0.5, -0.5),
            Vec2::new(-0.2, 0.5),
            Vec2::new(0.3, -0.2),
            Vec2::new(0.5, 0.5),
        ])
    }

    #[test]
    fn test_round_trip_on_curve_points() {
        let curves = [
            cubic(),
            Curve::Cubic([
                Vec2::new(-0.5, -0.5),
                Vec2::new(-0.2, 0.5),
                Vec2::new(0.2, 0.3),
                Vec2::new(0.5, 0.5),
            ]),
            Curve::Cubic([
                Vec2::new(-0.2, -0.8),
                Vec2::new(0.0, 0.3),
                Vec2::new(0.3, 0.3),
                Vec2::new(0.2, -0.8),
            ]),
        ];
        for curve in curves {
            for t0 in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0] {
                let p = curve.evaluate(t0);
                let t = project(&curve, p);
                assert!(
                    curve.evaluate(t).distance(p) < 1e-2,
                    "t0={t0} gave t={t} for {curve:?}"
                );
            }
        }
    }

    #[test]
    fn test_result_is_clamped() {
        let line = Curve::Linear([Vec2::ZERO, Vec2::X]);
        assert_eq!(project(&line, Vec2::new(5.0, 0.0)), 1.0);
        assert_eq!(project(&line, Vec2::new(-5.0, 1.0)), 0.0);
    }

    #[test]
    fn test_projection_off_curve_is_perpendicular() {
        let line = Curve::Linear([Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)]);
        let proj = project_with(&line, Vec2::new(0.3, 0.4), &ProjectionParams::default());
        assert!((proj.point.x - 0.3).abs() < 1e-3);
        assert!((proj.distance - 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_early_exit_at_stationary_point() {
        let line = Curve::Linear([Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)]);
        let proj = project_with(&line, Vec2::new(0.0, 1.0), &ProjectionParams::default());
        assert_eq!(proj.iterations, 0);
        assert_eq!(proj.t, 0.5);
    }

    #[test]
    fn test_numeric_derivative_path_agrees() {
        let curve = cubic();
        let params = ProjectionParams::default();
        let p = curve.evaluate(0.3);
        let analytic = project_with(&curve, p, &params);
        let numeric = project_fn(|t| curve.evaluate(t), p, &params);
        assert!(analytic.point.distance(numeric.point) < 1e-2);
    }

    #[test]
    fn test_iteration_cap_respected() {
        let params = ProjectionParams {
            max_iterations: 3,
            ..Default::default()
        };
        let proj = project_with(&cubic(), Vec2::new(-0.5, -0.5), &params);
        assert!(proj.iterations <= 3);
    }
}
