use std::fmt;

use serde::{Deserialize, Serialize};

use super::bezier;
use super::bspline::{fixed_control_points, BSplineCurve};
use super::nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
use super::quadratic::QuadraticSpline;
use super::{Curve, CurveEval};
use crate::error::Result;
use crate::geometry::{
    BoundingBox, Frame, Interval, Length, Point, SketchPlane, Vector, VectorBox,
};

/// A cubic Bézier curve.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CubicSpline<C, const D: usize> {
    control_points: [Point<C, D>; 4],
}

impl<C, const D: usize> CubicSpline<C, D> {
    pub fn new(
        first: Point<C, D>,
        second: Point<C, D>,
        third: Point<C, D>,
        fourth: Point<C, D>,
    ) -> Self {
        Self {
            control_points: [first, second, third, fourth],
        }
    }

    pub fn from_control_points(control_points: [Point<C, D>; 4]) -> Self {
        Self { control_points }
    }

    /// Hermite form: endpoints and the derivatives at those endpoints.
    pub fn from_endpoints(
        start_point: Point<C, D>,
        start_derivative: Vector<C, D>,
        end_point: Point<C, D>,
        end_derivative: Vector<C, D>,
    ) -> Self {
        Self::new(
            start_point,
            start_point + start_derivative / 3.0,
            end_point - end_derivative / 3.0,
            end_point,
        )
    }

    /// Exact degree elevation of a quadratic.
    pub fn from_quadratic(quadratic: &QuadraticSpline<C, D>) -> Self {
        let [q0, q1, q2] = *quadratic.control_points();
        Self::new(
            q0,
            Point::interpolate(&q0, &q1, 2.0 / 3.0),
            Point::interpolate(&q2, &q1, 2.0 / 3.0),
            q2,
        )
    }

    pub fn control_points(&self) -> &[Point<C, D>; 4] {
        &self.control_points
    }

    pub fn first_control_point(&self) -> Point<C, D> {
        self.control_points[0]
    }

    pub fn second_control_point(&self) -> Point<C, D> {
        self.control_points[1]
    }

    pub fn third_control_point(&self) -> Point<C, D> {
        self.control_points[2]
    }

    pub fn fourth_control_point(&self) -> Point<C, D> {
        self.control_points[3]
    }

    pub fn start_derivative(&self) -> Vector<C, D> {
        (self.control_points[1] - self.control_points[0]) * 3.0
    }

    pub fn end_derivative(&self) -> Vector<C, D> {
        (self.control_points[3] - self.control_points[2]) * 3.0
    }

    /// Constant third derivative.
    pub fn third_derivative_vector(&self) -> Vector<C, D> {
        let [p0, p1, p2, p3] = self.control_points;
        ((p3 - p2) - (p2 - p1) * 2.0 + (p1 - p0)) * 6.0
    }

    pub fn reverse(&self) -> Self {
        let [a, b, c, d] = self.control_points;
        Self::new(d, c, b, a)
    }

    pub fn split_at(&self, t: f64) -> (Self, Self) {
        let (left, right) = bezier::split(&bezier::coords_of(&self.control_points), t);
        (
            Self::from_control_points(bezier::points_from(&left)),
            Self::from_control_points(bezier::points_from(&right)),
        )
    }

    pub fn bisect(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> CubicSpline<L, D> {
        CubicSpline::from_control_points(self.control_points.map(|p| p.relative_to(frame)))
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> CubicSpline<G, D> {
        CubicSpline::from_control_points(self.control_points.map(|p| p.place_in(frame)))
    }

    pub(crate) fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        bezier::coincident_point(&self.control_points)
            .map(|p| Degenerate::new(DegeneracyKind::CoincidentControlPoints, p))
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Curve::from(*self).nondegenerate()
    }

    /// One cubic per non-empty knot span of a degree-3 B-spline.
    pub fn b_spline_segments(knots: &[f64], control_points: &[Point<C, D>]) -> Result<Vec<Self>> {
        BSplineCurve::new(3, control_points.to_vec(), Vec::new(), knots.to_vec())?
            .segments()
            .into_iter()
            .map(|segment| fixed_control_points(segment.control_points).map(Self::from_control_points))
            .collect()
    }
}

impl<C> CubicSpline<C, 3> {
    pub fn project_onto<L>(&self, plane: &SketchPlane<C, L>) -> Self {
        Self::from_control_points(self.control_points.map(|p| plane.project_onto(&p)))
    }

    pub fn project_into<L>(&self, plane: &SketchPlane<C, L>) -> CubicSpline<L, 2> {
        CubicSpline::from_control_points(self.control_points.map(|p| plane.project_into(&p)))
    }
}

impl<C> CubicSpline<C, 2> {
    pub fn on<G>(&self, plane: &SketchPlane<G, C>) -> CubicSpline<G, 3> {
        CubicSpline::from_control_points(self.control_points.map(|p| plane.place(&p)))
    }
}

impl<C, const D: usize> CurveEval<C, D> for CubicSpline<C, D> {
    fn point_on(&self, t: f64) -> Point<C, D> {
        bezier::point_on(&self.control_points, t)
    }

    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D> {
        bezier::nth_derivative(&self.control_points, n, t)
    }

    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D> {
        bezier::bounding_derivative(&self.control_points, order, &domain)
    }

    fn bounding_box(&self) -> BoundingBox<C, D> {
        BoundingBox::from_points(&self.control_points)
    }

    fn start_point(&self) -> Point<C, D> {
        self.control_points[0]
    }

    fn end_point(&self) -> Point<C, D> {
        self.control_points[3]
    }

    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        Some(bezier::length_bound(&self.control_points, &domain))
    }
}

impl<C, const D: usize> Clone for CubicSpline<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for CubicSpline<C, D> {}

impl<C, const D: usize> PartialEq for CubicSpline<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.control_points == other.control_points
    }
}

impl<C, const D: usize> fmt::Debug for CubicSpline<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CubicSpline")
            .field("control_points", &self.control_points)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2d, Point3d, Vector2d, Vector3d};
    use approx::assert_abs_diff_eq;

    enum World {}

    fn wave() -> CubicSpline<World, 2> {
        CubicSpline::new(
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 3.0),
            Point2d::new(4.0, -3.0),
            Point2d::new(5.0, 0.0),
        )
    }

    #[test]
    fn test_endpoints_exact() {
        let spline = wave();
        assert_eq!(spline.point_on(0.0), spline.first_control_point());
        assert_eq!(spline.point_on(1.0), spline.fourth_control_point());
    }

    #[test]
    fn test_from_endpoints_hermite() {
        let spline = CubicSpline::<World, 3>::from_endpoints(
            Point3d::new(0.0, 0.0, 0.0),
            Vector3d::new(3.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Vector3d::new(0.0, 3.0, 0.0),
        );
        assert_eq!(spline.start_derivative(), Vector3d::new(3.0, 0.0, 0.0));
        assert_eq!(spline.end_derivative(), Vector3d::new(0.0, 3.0, 0.0));
        assert_eq!(spline.first_derivative(0.0), spline.start_derivative());
        assert_eq!(spline.first_derivative(1.0), spline.end_derivative());
    }

    #[test]
    fn test_from_quadratic_is_same_curve() {
        let quadratic = QuadraticSpline::<World, 2>::new(
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(2.0, 0.0),
        );
        let cubic = CubicSpline::from_quadratic(&quadratic);
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            assert_abs_diff_eq!(cubic.point_on(t), quadratic.point_on(t), epsilon = 1e-14);
        }
        assert_eq!(cubic.point_on(1.0), quadratic.point_on(1.0));
    }

    #[test]
    fn test_third_derivative_constant() {
        let spline = wave();
        let expected = spline.third_derivative_vector();
        assert_abs_diff_eq!(spline.nth_derivative(3, 0.2), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(spline.nth_derivative(3, 0.9), expected, epsilon = 1e-12);
        assert_eq!(spline.nth_derivative(4, 0.5), Vector2d::zero());
    }

    #[test]
    fn test_split_halves() {
        let (left, right) = wave().bisect();
        for k in 0..=8 {
            let t = k as f64 / 8.0;
            assert_abs_diff_eq!(left.point_on(t), wave().point_on(0.5 * t), epsilon = 1e-14);
            assert_abs_diff_eq!(right.point_on(t), wave().point_on(0.5 + 0.5 * t), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_second_derivative_box_contains_samples() {
        let spline = wave();
        let domain = Interval::new(0.1, 0.35);
        let b = spline.second_derivative_bounding_box(domain);
        for k in 0..=20 {
            let t = domain.interpolate(k as f64 / 20.0);
            let d = spline.second_derivative(t);
            for i in 0..2 {
                let c = b.component(i);
                assert!(c.min() - 1e-9 <= d.component(i) && d.component(i) <= c.max() + 1e-9);
            }
        }
    }

    #[test]
    fn test_b_spline_uniform_segments_are_c1() {
        let points = [
            Point2d::<World>::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(2.0, -1.0),
            Point2d::new(3.0, 2.0),
            Point2d::new(4.0, 0.0),
        ];
        let knots = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];
        let segments = CubicSpline::b_spline_segments(&knots, &points).unwrap();
        assert_eq!(segments.len(), 2);
        assert_abs_diff_eq!(segments[0].end_point(), segments[1].start_point(), epsilon = 1e-14);
        // Both spans have width 0.5, so unscaled derivatives must also agree.
        assert_abs_diff_eq!(
            segments[0].end_derivative(),
            segments[1].start_derivative(),
            epsilon = 1e-12
        );
    }
}
