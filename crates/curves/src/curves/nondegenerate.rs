use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Curve, CurveEval};
use crate::error::CurveError;
use crate::geometry::{BoundingBox, Direction, Interval, Length, Point, Vector, VectorBox};

/// Highest derivative consulted when looking for a tangent at a zero-speed point.
const MAX_TANGENT_ORDER: usize = 8;

/// Derivatives smaller than this fraction of the curve's speed scale count as zero.
const VANISHING_RATIO: f64 = 1e-12;

/// Why a curve has no well-defined tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegeneracyKind {
    /// Every control point of a Bézier-family curve is the same point.
    CoincidentControlPoints,
    /// An elliptical arc with zero swept angle.
    ZeroSweep,
    /// An elliptical arc whose radii are both zero.
    ZeroRadii,
}

impl fmt::Display for DegeneracyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegeneracyKind::CoincidentControlPoints => write!(f, "all control points coincide"),
            DegeneracyKind::ZeroSweep => write!(f, "swept angle is zero"),
            DegeneracyKind::ZeroRadii => write!(f, "both radii are zero"),
        }
    }
}

/// Failure of the nondegeneracy check.
///
/// Carries the single point the curve collapses to, so callers can fall
/// back to treating the curve as that point (length zero, every query
/// answered by `point`).
pub struct Degenerate<C, const D: usize> {
    kind: DegeneracyKind,
    point: Point<C, D>,
}

impl<C, const D: usize> Degenerate<C, D> {
    pub(crate) fn new(kind: DegeneracyKind, point: Point<C, D>) -> Self {
        Self { kind, point }
    }

    pub fn kind(&self) -> DegeneracyKind {
        self.kind
    }

    pub fn point(&self) -> Point<C, D> {
        self.point
    }
}

impl<C, const D: usize> Clone for Degenerate<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for Degenerate<C, D> {}

impl<C, const D: usize> PartialEq for Degenerate<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.point == other.point
    }
}

impl<C, const D: usize> fmt::Debug for Degenerate<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Degenerate")
            .field("kind", &self.kind)
            .field("point", &self.point)
            .finish()
    }
}

impl<C, const D: usize> fmt::Display for Degenerate<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "degenerate curve ({}) at {:?}", self.kind, self.point)
    }
}

impl<C, const D: usize> std::error::Error for Degenerate<C, D> {}

impl<C, const D: usize> From<Degenerate<C, D>> for CurveError {
    fn from(degenerate: Degenerate<C, D>) -> Self {
        CurveError::Degenerate {
            kind: degenerate.kind,
        }
    }
}

/// A curve proven to have a tangent direction everywhere on `[0, 1]`.
///
/// Only obtainable through a nondegeneracy check such as
/// [`Curve::nondegenerate`]. Isolated zero-speed points (cusps) are allowed;
/// the tangent there comes from the first non-vanishing higher derivative.
pub struct Nondegenerate<C, const D: usize> {
    curve: Curve<C, D>,
    /// Upper bound on the speed over `[0, 1]`; always positive.
    scale: f64,
}

impl<C, const D: usize> Nondegenerate<C, D> {
    pub(crate) fn check(curve: Curve<C, D>) -> Result<Self, Degenerate<C, D>> {
        if let Some(degenerate) = curve.degeneracy() {
            debug!(
                family = curve.family_name(),
                kind = %degenerate.kind(),
                "nondegeneracy check failed"
            );
            return Err(degenerate);
        }
        let scale = curve
            .first_derivative_bounding_box(Interval::unit())
            .max_magnitude()
            .in_meters();
        Ok(Self { curve, scale })
    }

    pub fn curve(&self) -> &Curve<C, D> {
        &self.curve
    }

    pub fn into_curve(self) -> Curve<C, D> {
        self.curve
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Unit tangent in the direction of increasing parameter.
    ///
    /// At `t >= 1` the tangent is the limit approached from the left.
    pub fn tangent_direction(&self, t: f64) -> Direction<C, D> {
        let threshold = self.scale * VANISHING_RATIO;
        let from_left = t >= 1.0;
        for order in 1..=MAX_TANGENT_ORDER {
            let derivative = self.curve.nth_derivative(order, t);
            if derivative.magnitude().in_meters() > threshold {
                let oriented = if from_left && order % 2 == 0 {
                    -derivative
                } else {
                    derivative
                };
                if let Some(direction) = oriented.direction() {
                    return direction;
                }
            }
        }
        (self.curve.end_point() - self.curve.start_point())
            .direction()
            .unwrap_or_else(|| Direction::axis(0))
    }

    pub fn reverse(&self) -> Self {
        Self {
            curve: self.curve.reverse(),
            scale: self.scale,
        }
    }
}

impl<C, const D: usize> Clone for Nondegenerate<C, D> {
    fn clone(&self) -> Self {
        Self {
            curve: self.curve.clone(),
            scale: self.scale,
        }
    }
}

impl<C, const D: usize> fmt::Debug for Nondegenerate<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nondegenerate")
            .field("curve", &self.curve)
            .field("scale", &self.scale)
            .finish()
    }
}

impl<C, const D: usize> CurveEval<C, D> for Nondegenerate<C, D> {
    fn point_on(&self, t: f64) -> Point<C, D> {
        self.curve.point_on(t)
    }

    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D> {
        self.curve.nth_derivative(n, t)
    }

    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D> {
        self.curve.derivative_bounding_box(order, domain)
    }

    fn bounding_box(&self) -> BoundingBox<C, D> {
        self.curve.bounding_box()
    }

    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        self.curve.length_upper_bound(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{CubicSpline, EllipticalArc, QuadraticSpline};
    use crate::geometry::{Angle, Point2d, Vector2d};
    use approx::assert_abs_diff_eq;

    enum World {}

    #[test]
    fn test_coincident_control_points_are_degenerate() {
        let p = Point2d::<World>::new(1.0, 2.0);
        let failure = QuadraticSpline::new(p, p, p).nondegenerate().unwrap_err();
        assert_eq!(failure.kind(), DegeneracyKind::CoincidentControlPoints);
        assert_eq!(failure.point(), p);
        let error: CurveError = failure.into();
        assert!(matches!(
            error,
            CurveError::Degenerate {
                kind: DegeneracyKind::CoincidentControlPoints
            }
        ));
    }

    #[test]
    fn test_nearly_coincident_is_nondegenerate() {
        let p = Point2d::<World>::new(1.0, 2.0);
        let q = Point2d::new(1.0, 2.0 + 1e-12);
        assert!(QuadraticSpline::new(p, p, q).nondegenerate().is_ok());
    }

    #[test]
    fn test_zero_sweep_is_degenerate() {
        let arc = EllipticalArc::<World, 2>::circular(
            Point2d::origin(),
            Length::meters(1.0),
            Angle::radians(0.3),
            Angle::zero(),
        );
        let failure = arc.nondegenerate().unwrap_err();
        assert_eq!(failure.kind(), DegeneracyKind::ZeroSweep);
        assert_eq!(failure.point(), arc.start_point());
    }

    #[test]
    fn test_zero_radii_is_degenerate() {
        let arc = EllipticalArc::<World, 2>::circular(
            Point2d::new(3.0, 4.0),
            Length::zero(),
            Angle::zero(),
            Angle::half_turn(),
        );
        let failure = arc.nondegenerate().unwrap_err();
        assert_eq!(failure.kind(), DegeneracyKind::ZeroRadii);
        assert_eq!(failure.point(), Point2d::new(3.0, 4.0));
    }

    #[test]
    fn test_tangent_at_cusp_uses_second_derivative() {
        // First two control points coincide: zero speed at t = 0.
        let p0 = Point2d::<World>::new(0.0, 0.0);
        let spline = QuadraticSpline::new(p0, p0, Point2d::new(2.0, 0.0));
        let curve = spline.nondegenerate().unwrap();
        assert_abs_diff_eq!(
            curve.tangent_direction(0.0).to_vector(),
            Vector2d::new(1.0, 0.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_tangent_from_left_at_end_cusp() {
        // Last two control points coincide: zero speed at t = 1, approached
        // while moving in +x.
        let p2 = Point2d::<World>::new(2.0, 0.0);
        let spline = QuadraticSpline::new(Point2d::new(0.0, 0.0), p2, p2);
        let curve = spline.nondegenerate().unwrap();
        assert_abs_diff_eq!(
            curve.tangent_direction(1.0).to_vector(),
            Vector2d::new(1.0, 0.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_tangent_of_regular_cubic() {
        let spline = CubicSpline::new(
            Point2d::<World>::new(0.0, 0.0),
            Point2d::new(0.0, 1.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(1.0, 0.0),
        );
        let curve = spline.nondegenerate().unwrap();
        assert_abs_diff_eq!(
            curve.tangent_direction(0.0).to_vector(),
            Vector2d::new(0.0, 1.0),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            curve.tangent_direction(1.0).to_vector(),
            Vector2d::new(0.0, -1.0),
            epsilon = 1e-15
        );
        assert!(curve.scale() > 0.0);
    }
}
