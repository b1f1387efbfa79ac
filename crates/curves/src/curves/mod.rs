pub mod bezier;
pub mod bspline;
pub mod cubic;
pub mod elliptical;
pub mod nondegenerate;
pub mod quadratic;
pub mod rational;
pub mod spline;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arclength::{ArcLengthCurve, ParameterizationConfig, ParameterizedCurve};
use crate::error::Result;
use crate::geometry::{BoundingBox, Frame, Interval, Length, Point, Vector, VectorBox};

pub use bspline::{BSplineCurve, BSplineSegment};
pub use cubic::CubicSpline;
pub use elliptical::EllipticalArc;
pub use nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
pub use quadratic::QuadraticSpline;
pub use rational::RationalCubicSpline;
pub use spline::Spline;

/// Evaluation interface shared by every curve family.
///
/// Curves are parameterized over `[0, 1]`; evaluating outside that range
/// extrapolates and never fails.
pub trait CurveEval<C, const D: usize> {
    /// Position at parameter `t`. Exact control data at `t = 0` and `t = 1`.
    fn point_on(&self, t: f64) -> Point<C, D>;

    /// The `n`-th derivative with respect to the parameter.
    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D>;

    /// Box containing the `order`-th derivative for every `t` in `domain`.
    ///
    /// Shrinks linearly with the width of `domain`.
    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D>;

    /// Box containing the whole curve over `[0, 1]`.
    fn bounding_box(&self) -> BoundingBox<C, D>;

    fn start_point(&self) -> Point<C, D> {
        self.point_on(0.0)
    }

    fn end_point(&self) -> Point<C, D> {
        self.point_on(1.0)
    }

    fn first_derivative(&self, t: f64) -> Vector<C, D> {
        self.nth_derivative(1, t)
    }

    fn second_derivative(&self, t: f64) -> Vector<C, D> {
        self.nth_derivative(2, t)
    }

    fn first_derivative_bounding_box(&self, domain: Interval) -> VectorBox<C, D> {
        self.derivative_bounding_box(1, domain)
    }

    fn second_derivative_bounding_box(&self, domain: Interval) -> VectorBox<C, D> {
        self.derivative_bounding_box(2, domain)
    }

    /// An upper bound on the arc length over `domain` tighter than
    /// max-speed times width, if the family has one.
    fn length_upper_bound(&self, _domain: Interval) -> Option<Length> {
        None
    }

    /// Number of equal parameter steps for a polyline within `max_error` of
    /// the curve, from the second derivative bound.
    fn num_approximation_segments(&self, max_error: Length) -> usize {
        let max_error = max_error.in_meters();
        if !(max_error > 0.0) {
            return 1;
        }
        let m2 = self
            .second_derivative_bounding_box(Interval::unit())
            .max_magnitude()
            .in_meters();
        let count = (m2 / (8.0 * max_error)).sqrt().ceil();
        if count.is_finite() && count >= 1.0 {
            count as usize
        } else {
            1
        }
    }

    /// Polyline within `max_error` of the curve, including both endpoints.
    fn approximate(&self, max_error: Length) -> Vec<Point<C, D>> {
        let n = self.num_approximation_segments(max_error);
        (0..=n).map(|i| self.point_on(i as f64 / n as f64)).collect()
    }
}

/// Any curve family, dispatched by `match`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Curve<C, const D: usize> {
    Quadratic(QuadraticSpline<C, D>),
    Cubic(CubicSpline<C, D>),
    RationalCubic(RationalCubicSpline<C, D>),
    EllipticalArc(EllipticalArc<C, D>),
    Spline(Spline<C, D>),
}

impl<C, const D: usize> Curve<C, D> {
    /// Human-readable family name, for logs and reports.
    pub fn family_name(&self) -> &'static str {
        match self {
            Curve::Quadratic(_) => "QuadraticSpline",
            Curve::Cubic(_) => "CubicSpline",
            Curve::RationalCubic(_) => "RationalCubicSpline",
            Curve::EllipticalArc(_) => "EllipticalArc",
            Curve::Spline(_) => "Spline",
        }
    }

    /// The reason this curve has no tangent, if any.
    pub fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        match self {
            Curve::Quadratic(c) => c.degeneracy(),
            Curve::Cubic(c) => c.degeneracy(),
            Curve::RationalCubic(c) => c.degeneracy(),
            Curve::EllipticalArc(c) => c.degeneracy(),
            Curve::Spline(c) => c.degeneracy(),
        }
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Nondegenerate::check(self.clone())
    }

    /// Arc-length view of this curve, collapsing degenerate curves to the
    /// point they occupy.
    ///
    /// Fails only when `config` itself is invalid.
    pub fn arc_length_curve(&self, config: &ParameterizationConfig) -> Result<ArcLengthCurve<C, D>> {
        match self.nondegenerate() {
            Ok(curve) => Ok(ArcLengthCurve::Parameterized(ParameterizedCurve::new(
                curve, config,
            )?)),
            Err(degenerate) => {
                config.validate()?;
                Ok(ArcLengthCurve::Point(degenerate.point()))
            }
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            Curve::Quadratic(c) => Curve::Quadratic(c.reverse()),
            Curve::Cubic(c) => Curve::Cubic(c.reverse()),
            Curve::RationalCubic(c) => Curve::RationalCubic(c.reverse()),
            Curve::EllipticalArc(c) => Curve::EllipticalArc(c.reverse()),
            Curve::Spline(c) => Curve::Spline(c.reverse()),
        }
    }

    pub fn split_at(&self, t: f64) -> (Self, Self) {
        match self {
            Curve::Quadratic(c) => {
                let (a, b) = c.split_at(t);
                (a.into(), b.into())
            }
            Curve::Cubic(c) => {
                let (a, b) = c.split_at(t);
                (a.into(), b.into())
            }
            Curve::RationalCubic(c) => {
                let (a, b) = c.split_at(t);
                (a.into(), b.into())
            }
            Curve::EllipticalArc(c) => {
                let (a, b) = c.split_at(t);
                (a.into(), b.into())
            }
            Curve::Spline(c) => {
                let (a, b) = c.split_at(t);
                (a.into(), b.into())
            }
        }
    }

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> Curve<L, D> {
        match self {
            Curve::Quadratic(c) => Curve::Quadratic(c.relative_to(frame)),
            Curve::Cubic(c) => Curve::Cubic(c.relative_to(frame)),
            Curve::RationalCubic(c) => Curve::RationalCubic(c.relative_to(frame)),
            Curve::EllipticalArc(c) => Curve::EllipticalArc(c.relative_to(frame)),
            Curve::Spline(c) => Curve::Spline(c.relative_to(frame)),
        }
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> Curve<G, D> {
        match self {
            Curve::Quadratic(c) => Curve::Quadratic(c.place_in(frame)),
            Curve::Cubic(c) => Curve::Cubic(c.place_in(frame)),
            Curve::RationalCubic(c) => Curve::RationalCubic(c.place_in(frame)),
            Curve::EllipticalArc(c) => Curve::EllipticalArc(c.place_in(frame)),
            Curve::Spline(c) => Curve::Spline(c.place_in(frame)),
        }
    }
}

impl<C, const D: usize> CurveEval<C, D> for Curve<C, D> {
    fn point_on(&self, t: f64) -> Point<C, D> {
        match self {
            Curve::Quadratic(c) => c.point_on(t),
            Curve::Cubic(c) => c.point_on(t),
            Curve::RationalCubic(c) => c.point_on(t),
            Curve::EllipticalArc(c) => c.point_on(t),
            Curve::Spline(c) => c.point_on(t),
        }
    }

    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D> {
        match self {
            Curve::Quadratic(c) => c.nth_derivative(n, t),
            Curve::Cubic(c) => c.nth_derivative(n, t),
            Curve::RationalCubic(c) => c.nth_derivative(n, t),
            Curve::EllipticalArc(c) => c.nth_derivative(n, t),
            Curve::Spline(c) => c.nth_derivative(n, t),
        }
    }

    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D> {
        match self {
            Curve::Quadratic(c) => c.derivative_bounding_box(order, domain),
            Curve::Cubic(c) => c.derivative_bounding_box(order, domain),
            Curve::RationalCubic(c) => c.derivative_bounding_box(order, domain),
            Curve::EllipticalArc(c) => c.derivative_bounding_box(order, domain),
            Curve::Spline(c) => c.derivative_bounding_box(order, domain),
        }
    }

    fn bounding_box(&self) -> BoundingBox<C, D> {
        match self {
            Curve::Quadratic(c) => c.bounding_box(),
            Curve::Cubic(c) => c.bounding_box(),
            Curve::RationalCubic(c) => c.bounding_box(),
            Curve::EllipticalArc(c) => c.bounding_box(),
            Curve::Spline(c) => c.bounding_box(),
        }
    }

    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        match self {
            Curve::Quadratic(c) => c.length_upper_bound(domain),
            Curve::Cubic(c) => c.length_upper_bound(domain),
            Curve::RationalCubic(c) => c.length_upper_bound(domain),
            Curve::EllipticalArc(c) => c.length_upper_bound(domain),
            Curve::Spline(c) => c.length_upper_bound(domain),
        }
    }
}

impl<C, const D: usize> Clone for Curve<C, D> {
    fn clone(&self) -> Self {
        match self {
            Curve::Quadratic(c) => Curve::Quadratic(*c),
            Curve::Cubic(c) => Curve::Cubic(*c),
            Curve::RationalCubic(c) => Curve::RationalCubic(*c),
            Curve::EllipticalArc(c) => Curve::EllipticalArc(*c),
            Curve::Spline(c) => Curve::Spline(c.clone()),
        }
    }
}

impl<C, const D: usize> PartialEq for Curve<C, D> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Curve::Quadratic(a), Curve::Quadratic(b)) => a == b,
            (Curve::Cubic(a), Curve::Cubic(b)) => a == b,
            (Curve::RationalCubic(a), Curve::RationalCubic(b)) => a == b,
            (Curve::EllipticalArc(a), Curve::EllipticalArc(b)) => a == b,
            (Curve::Spline(a), Curve::Spline(b)) => a == b,
            _ => false,
        }
    }
}

impl<C, const D: usize> fmt::Debug for Curve<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Quadratic(c) => f.debug_tuple("Quadratic").field(c).finish(),
            Curve::Cubic(c) => f.debug_tuple("Cubic").field(c).finish(),
            Curve::RationalCubic(c) => f.debug_tuple("RationalCubic").field(c).finish(),
            Curve::EllipticalArc(c) => f.debug_tuple("EllipticalArc").field(c).finish(),
            Curve::Spline(c) => f.debug_tuple("Spline").field(c).finish(),
        }
    }
}

impl<C, const D: usize> From<QuadraticSpline<C, D>> for Curve<C, D> {
    fn from(curve: QuadraticSpline<C, D>) -> Self {
        Curve::Quadratic(curve)
    }
}

impl<C, const D: usize> From<CubicSpline<C, D>> for Curve<C, D> {
    fn from(curve: CubicSpline<C, D>) -> Self {
        Curve::Cubic(curve)
    }
}

impl<C, const D: usize> From<RationalCubicSpline<C, D>> for Curve<C, D> {
    fn from(curve: RationalCubicSpline<C, D>) -> Self {
        Curve::RationalCubic(curve)
    }
}

impl<C, const D: usize> From<EllipticalArc<C, D>> for Curve<C, D> {
    fn from(curve: EllipticalArc<C, D>) -> Self {
        Curve::EllipticalArc(curve)
    }
}

impl<C, const D: usize> From<Spline<C, D>> for Curve<C, D> {
    fn from(curve: Spline<C, D>) -> Self {
        Curve::Spline(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Angle, Point2d};

    enum World {}

    fn sample_curves() -> Vec<Curve<World, 2>> {
        vec![
            QuadraticSpline::new(Point2d::new(0.0, 0.0), Point2d::new(1.0, 2.0), Point2d::new(2.0, 0.0))
                .into(),
            CubicSpline::new(
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 2.0),
                Point2d::new(2.0, -1.0),
                Point2d::new(3.0, 0.5),
            )
            .into(),
            EllipticalArc::circular(
                Point2d::new(1.0, 1.0),
                Length::meters(2.0),
                Angle::degrees(10.0),
                Angle::degrees(200.0),
            )
            .into(),
        ]
    }

    #[test]
    fn test_family_names() {
        let names: Vec<_> = sample_curves().iter().map(|c| c.family_name()).collect();
        assert_eq!(names, vec!["QuadraticSpline", "CubicSpline", "EllipticalArc"]);
    }

    #[test]
    fn test_dispatch_matches_family() {
        let quadratic =
            QuadraticSpline::<World, 2>::new(Point2d::new(0.0, 0.0), Point2d::new(1.0, 2.0), Point2d::new(2.0, 0.0));
        let curve: Curve<World, 2> = quadratic.into();
        assert_eq!(curve.point_on(0.3), quadratic.point_on(0.3));
        assert_eq!(curve.first_derivative(0.3), quadratic.first_derivative(0.3));
        assert_eq!(curve.start_point(), Point2d::new(0.0, 0.0));
        assert_eq!(curve.end_point(), Point2d::new(2.0, 0.0));
    }

    #[test]
    fn test_approximation_segment_count() {
        // Second derivative of this quadratic is constant (0, -8).
        let curve: Curve<World, 2> =
            QuadraticSpline::new(Point2d::new(0.0, 0.0), Point2d::new(1.0, 2.0), Point2d::new(2.0, 0.0)).into();
        // sqrt(8 / (8 * 0.02)) = 7.07...
        assert_eq!(curve.num_approximation_segments(Length::meters(0.02)), 8);
        assert_eq!(curve.num_approximation_segments(Length::meters(100.0)), 1);
        assert_eq!(curve.num_approximation_segments(Length::meters(-1.0)), 1);
        let polyline = curve.approximate(Length::meters(0.02));
        assert_eq!(polyline.len(), 9);
        assert_eq!(polyline[0], curve.start_point());
        assert_eq!(polyline[8], curve.end_point());
    }

    #[test]
    fn test_bounding_box_contains_samples() {
        for curve in sample_curves() {
            let bb = curve.bounding_box();
            for k in 0..=50 {
                let p = curve.point_on(k as f64 / 50.0);
                let slack = BoundingBox::new(
                    bb.min - Vector::from_components(nalgebra::SVector::repeat(1e-12)),
                    bb.max + Vector::from_components(nalgebra::SVector::repeat(1e-12)),
                );
                assert!(slack.contains(&p), "{} escapes its box", curve.family_name());
            }
        }
    }

    #[test]
    fn test_reverse_dispatch() {
        for curve in sample_curves() {
            let reversed = curve.reverse();
            assert_eq!(reversed.start_point(), curve.end_point());
            assert_eq!(reversed.reverse(), curve);
        }
    }
}
