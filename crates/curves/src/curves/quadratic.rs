use std::fmt;

use serde::{Deserialize, Serialize};

use super::bezier;
use super::bspline::{fixed_control_points, BSplineCurve};
use super::nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
use super::{Curve, CurveEval};
use crate::error::Result;
use crate::geometry::{
    BoundingBox, Frame, Interval, Length, Point, SketchPlane, Vector, VectorBox,
};

/// A quadratic Bézier curve.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct QuadraticSpline<C, const D: usize> {
    control_points: [Point<C, D>; 3],
}

impl<C, const D: usize> QuadraticSpline<C, D> {
    pub fn new(first: Point<C, D>, second: Point<C, D>, third: Point<C, D>) -> Self {
        Self {
            control_points: [first, second, third],
        }
    }

    pub fn from_control_points(control_points: [Point<C, D>; 3]) -> Self {
        Self { control_points }
    }

    pub fn control_points(&self) -> &[Point<C, D>; 3] {
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

    /// Derivative at `t = 0`.
    pub fn start_derivative(&self) -> Vector<C, D> {
        (self.control_points[1] - self.control_points[0]) * 2.0
    }

    /// Derivative at `t = 1`.
    pub fn end_derivative(&self) -> Vector<C, D> {
        (self.control_points[2] - self.control_points[1]) * 2.0
    }

    /// Constant second derivative.
    pub fn second_derivative_vector(&self) -> Vector<C, D> {
        self.end_derivative() - self.start_derivative()
    }

    pub fn reverse(&self) -> Self {
        let [a, b, c] = self.control_points;
        Self::new(c, b, a)
    }

    /// Split into the pieces over `[0, t]` and `[t, 1]`.
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

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> QuadraticSpline<L, D> {
        QuadraticSpline::from_control_points(self.control_points.map(|p| p.relative_to(frame)))
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> QuadraticSpline<G, D> {
        QuadraticSpline::from_control_points(self.control_points.map(|p| p.place_in(frame)))
    }

    pub(crate) fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        bezier::coincident_point(&self.control_points)
            .map(|p| Degenerate::new(DegeneracyKind::CoincidentControlPoints, p))
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Curve::from(*self).nondegenerate()
    }

    /// One quadratic per non-empty knot span of a degree-2 B-spline.
    ///
    /// `knots` must have `control_points.len() + 3` entries.
    pub fn b_spline_segments(knots: &[f64], control_points: &[Point<C, D>]) -> Result<Vec<Self>> {
        BSplineCurve::new(2, control_points.to_vec(), Vec::new(), knots.to_vec())?
            .segments()
            .into_iter()
            .map(|segment| fixed_control_points(segment.control_points).map(Self::from_control_points))
            .collect()
    }
}

impl<C> QuadraticSpline<C, 3> {
    /// Orthogonal projection onto `plane`, staying in 3D.
    pub fn project_onto<L>(&self, plane: &SketchPlane<C, L>) -> Self {
        Self::from_control_points(self.control_points.map(|p| plane.project_onto(&p)))
    }

    /// Project into the 2D coordinates of `plane`.
    pub fn project_into<L>(&self, plane: &SketchPlane<C, L>) -> QuadraticSpline<L, 2> {
        QuadraticSpline::from_control_points(self.control_points.map(|p| plane.project_into(&p)))
    }
}

impl<C> QuadraticSpline<C, 2> {
    /// Embed this planar curve in 3D on `plane`.
    pub fn on<G>(&self, plane: &SketchPlane<G, C>) -> QuadraticSpline<G, 3> {
        QuadraticSpline::from_control_points(self.control_points.map(|p| plane.place(&p)))
    }
}

impl<C, const D: usize> CurveEval<C, D> for QuadraticSpline<C, D> {
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
        self.control_points[2]
    }

    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        Some(bezier::length_bound(&self.control_points, &domain))
    }
}

impl<C, const D: usize> Clone for QuadraticSpline<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for QuadraticSpline<C, D> {}

impl<C, const D: usize> PartialEq for QuadraticSpline<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.control_points == other.control_points
    }
}

impl<C, const D: usize> fmt::Debug for QuadraticSpline<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadraticSpline")
            .field("control_points", &self.control_points)
            .finish()
    }
}
