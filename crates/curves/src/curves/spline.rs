use std::fmt;

use serde::{Deserialize, Serialize};

use super::bezier;
use super::bspline::BSplineCurve;
use super::nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
use super::{Curve, CurveEval};
use crate::error::{CurveError, Result};
use crate::geometry::{
    BoundingBox, Frame, Interval, Length, Point, SketchPlane, Vector, VectorBox,
};

/// A Bézier curve of arbitrary degree (one less than the number of control
/// points).
#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "SplineData<C, D>")]
pub struct Spline<C, const D: usize> {
    control_points: Vec<Point<C, D>>,
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct SplineData<C, const D: usize> {
    control_points: Vec<Point<C, D>>,
}

impl<C, const D: usize> TryFrom<SplineData<C, D>> for Spline<C, D> {
    type Error = CurveError;

    fn try_from(data: SplineData<C, D>) -> Result<Self> {
        Self::new(data.control_points)
    }
}

impl<C, const D: usize> Spline<C, D> {
    /// Fails if `control_points` is empty.
    pub fn new(control_points: Vec<Point<C, D>>) -> Result<Self> {
        if control_points.is_empty() {
            return Err(CurveError::InsufficientControlPoints {
                required: 1,
                actual: 0,
            });
        }
        Ok(Self { control_points })
    }

    pub fn control_points(&self) -> &[Point<C, D>] {
        &self.control_points
    }

    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn start_derivative(&self) -> Vector<C, D> {
        self.first_derivative(0.0)
    }

    pub fn end_derivative(&self) -> Vector<C, D> {
        self.first_derivative(1.0)
    }

    pub fn reverse(&self) -> Self {
        Self {
            control_points: self.control_points.iter().rev().copied().collect(),
        }
    }

    pub fn split_at(&self, t: f64) -> (Self, Self) {
        let (left, right) = bezier::split(&bezier::coords_of(&self.control_points), t);
        let rebuild = |coords: Vec<_>| Self {
            control_points: coords.into_iter().map(Point::from_coords).collect(),
        };
        (rebuild(left), rebuild(right))
    }

    pub fn bisect(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> Spline<L, D> {
        Spline {
            control_points: self.control_points.iter().map(|p| p.relative_to(frame)).collect(),
        }
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> Spline<G, D> {
        Spline {
            control_points: self.control_points.iter().map(|p| p.place_in(frame)).collect(),
        }
    }

    pub(crate) fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        bezier::coincident_point(&self.control_points)
            .map(|p| Degenerate::new(DegeneracyKind::CoincidentControlPoints, p))
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Curve::from(self.clone()).nondegenerate()
    }

    /// Bézier segments of a non-rational B-spline of the given degree.
    pub fn b_spline_segments(
        degree: usize,
        knots: &[f64],
        control_points: &[Point<C, D>],
    ) -> Result<Vec<Self>> {
        let segments = BSplineCurve::new(degree, control_points.to_vec(), Vec::new(), knots.to_vec())?
            .segments();
        Ok(segments
            .into_iter()
            .map(|segment| Self {
                control_points: segment.control_points,
            })
            .collect())
    }
}

impl<C> Spline<C, 3> {
    pub fn project_onto<L>(&self, plane: &SketchPlane<C, L>) -> Self {
        Self {
            control_points: self.control_points.iter().map(|p| plane.project_onto(p)).collect(),
        }
    }

    pub fn project_into<L>(&self, plane: &SketchPlane<C, L>) -> Spline<L, 2> {
        Spline {
            control_points: self.control_points.iter().map(|p| plane.project_into(p)).collect(),
        }
    }
}

impl<C> Spline<C, 2> {
    pub fn on<G>(&self, plane: &SketchPlane<G, C>) -> Spline<G, 3> {
        Spline {
            control_points: self.control_points.iter().map(|p| plane.place(p)).collect(),
        }
    }
}

impl<C, const D: usize> CurveEval<C, D> for Spline<C, D> {
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

    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        Some(bezier::length_bound(&self.control_points, &domain))
    }
}

impl<C, const D: usize> Clone for Spline<C, D> {
    fn clone(&self) -> Self {
        Self {
            control_points: self.control_points.clone(),
        }
    }
}

impl<C, const D: usize> PartialEq for Spline<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.control_points == other.control_points
    }
}

impl<C, const D: usize> fmt::Debug for Spline<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spline")
            .field("control_points", &self.control_points)
            .finish()
    }
}
