use std::fmt;

use serde::{Deserialize, Serialize};

use super::bezier::{self, Coords};
use super::bspline::{fixed_control_points, BSplineCurve};
use super::nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
use super::{Curve, CurveEval};
use crate::error::{CurveError, Result};
use crate::geometry::{
    BoundingBox, Frame, Interval, Length, Point, SketchPlane, Vector, VectorBox,
};

/// A rational cubic Bézier curve with positive weights.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "RationalCubicSplineData<C, D>")]
pub struct RationalCubicSpline<C, const D: usize> {
    control_points: [Point<C, D>; 4],
    weights: [f64; 4],
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct RationalCubicSplineData<C, const D: usize> {
    control_points: [Point<C, D>; 4],
    weights: [f64; 4],
}

impl<C, const D: usize> TryFrom<RationalCubicSplineData<C, D>> for RationalCubicSpline<C, D> {
    type Error = CurveError;

    fn try_from(data: RationalCubicSplineData<C, D>) -> Result<Self> {
        Self::new(data.control_points, data.weights)
    }
}

pub(crate) fn validate_weights(weights: &[f64]) -> Result<()> {
    for (index, &value) in weights.iter().enumerate() {
        if !(value > 0.0 && value.is_finite()) {
            return Err(CurveError::InvalidWeight { index, value });
        }
    }
    Ok(())
}

impl<C, const D: usize> RationalCubicSpline<C, D> {
    /// Fails with [`CurveError::InvalidWeight`] unless every weight is
    /// positive and finite.
    pub fn new(control_points: [Point<C, D>; 4], weights: [f64; 4]) -> Result<Self> {
        validate_weights(&weights)?;
        Ok(Self {
            control_points,
            weights,
        })
    }

    pub fn control_points(&self) -> &[Point<C, D>; 4] {
        &self.control_points
    }

    pub fn weights(&self) -> &[f64; 4] {
        &self.weights
    }

    pub fn weighted_control_points(&self) -> [(Point<C, D>, f64); 4] {
        std::array::from_fn(|i| (self.control_points[i], self.weights[i]))
    }

    fn coords(&self) -> Vec<Coords<D>> {
        bezier::coords_of(&self.control_points)
    }

    pub fn start_derivative(&self) -> Vector<C, D> {
        (self.control_points[1] - self.control_points[0]) * (3.0 * self.weights[1] / self.weights[0])
    }

    pub fn end_derivative(&self) -> Vector<C, D> {
        (self.control_points[3] - self.control_points[2]) * (3.0 * self.weights[2] / self.weights[3])
    }

    pub fn reverse(&self) -> Self {
        let [a, b, c, d] = self.control_points;
        let [wa, wb, wc, wd] = self.weights;
        Self {
            control_points: [d, c, b, a],
            weights: [wd, wc, wb, wa],
        }
    }

    /// Split points and weights together through the rational de Casteljau
    /// construction.
    pub fn split_at(&self, t: f64) -> (Self, Self) {
        let ((lp, lw), (rp, rw)) = bezier::rational_split(&self.coords(), &self.weights, t);
        (Self::from_parts(&lp, &lw), Self::from_parts(&rp, &rw))
    }

    pub fn bisect(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    /// Weights produced by convex combinations of positive weights stay
    /// positive, so no validation is needed here.
    fn from_parts(points: &[Coords<D>], weights: &[f64]) -> Self {
        Self {
            control_points: bezier::points_from(points),
            weights: std::array::from_fn(|i| weights[i]),
        }
    }

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> RationalCubicSpline<L, D> {
        RationalCubicSpline {
            control_points: self.control_points.map(|p| p.relative_to(frame)),
            weights: self.weights,
        }
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> RationalCubicSpline<G, D> {
        RationalCubicSpline {
            control_points: self.control_points.map(|p| p.place_in(frame)),
            weights: self.weights,
        }
    }

    pub(crate) fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        bezier::coincident_point(&self.control_points)
            .map(|p| Degenerate::new(DegeneracyKind::CoincidentControlPoints, p))
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Curve::from(*self).nondegenerate()
    }

    /// One rational cubic per non-empty knot span of a degree-3 NURBS curve.
    pub fn b_spline_segments(
        knots: &[f64],
        weighted_control_points: &[(Point<C, D>, f64)],
    ) -> Result<Vec<Self>> {
        let (points, weights): (Vec<_>, Vec<_>) = weighted_control_points.iter().copied().unzip();
        BSplineCurve::new(3, points, weights, knots.to_vec())?
            .segments()
            .into_iter()
            .map(|segment| {
                let control_points = fixed_control_points(segment.control_points)?;
                let weights = fixed_weights(&segment.weights)?;
                Self::new(control_points, weights)
            })
            .collect()
    }
}

fn fixed_weights(weights: &[f64]) -> Result<[f64; 4]> {
    <[f64; 4]>::try_from(weights).map_err(|_| CurveError::InsufficientControlPoints {
        required: 4,
        actual: weights.len(),
    })
}

impl<C> RationalCubicSpline<C, 3> {
    pub fn project_onto<L>(&self, plane: &SketchPlane<C, L>) -> Self {
        Self {
            control_points: self.control_points.map(|p| plane.project_onto(&p)),
            weights: self.weights,
        }
    }

    pub fn project_into<L>(&self, plane: &SketchPlane<C, L>) -> RationalCubicSpline<L, 2> {
        RationalCubicSpline {
            control_points: self.control_points.map(|p| plane.project_into(&p)),
            weights: self.weights,
        }
    }
}

impl<C> RationalCubicSpline<C, 2> {
    pub fn on<G>(&self, plane: &SketchPlane<G, C>) -> RationalCubicSpline<G, 3> {
        RationalCubicSpline {
            control_points: self.control_points.map(|p| plane.place(&p)),
            weights: self.weights,
        }
    }
}

impl<C, const D: usize> CurveEval<C, D> for RationalCubicSpline<C, D> {
    fn point_on(&self, t: f64) -> Point<C, D> {
        Point::from_coords(bezier::rational_de_casteljau(&self.coords(), &self.weights, t))
    }

    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D> {
        let derivatives = bezier::rational_derivatives(&self.coords(), &self.weights, n, t);
        derivatives
            .last()
            .map(|d| Vector::from_components(*d))
            .unwrap_or_else(Vector::zero)
    }

    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D> {
        bezier::rational_derivative_box(&self.coords(), &self.weights, order, &domain)
    }

    /// Positive weights keep the curve inside the control polygon's hull.
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
        let (restricted, _) = bezier::rational_restrict(&self.coords(), &self.weights, &domain);
        Some(Length::meters(bezier::polygon_length(&restricted)))
    }
}

impl<C, const D: usize> Clone for RationalCubicSpline<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for RationalCubicSpline<C, D> {}

impl<C, const D: usize> PartialEq for RationalCubicSpline<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.control_points == other.control_points && self.weights == other.weights
    }
}

impl<C, const D: usize> fmt::Debug for RationalCubicSpline<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RationalCubicSpline")
            .field("control_points", &self.control_points)
            .field("weights", &self.weights)
            .finish()
    }
}
