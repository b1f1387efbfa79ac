use std::fmt;

use super::config::ParameterizationConfig;
use super::parameterization::ArcLengthParameterization;
use crate::curves::{Curve, CurveEval, Nondegenerate};
use crate::error::Result;
use crate::geometry::{Direction, Length, Point};

/// A nondegenerate curve together with its arc-length table, evaluated by
/// distance along the curve instead of by parameter.
pub struct ParameterizedCurve<C, const D: usize> {
    curve: Nondegenerate<C, D>,
    parameterization: ArcLengthParameterization,
}

impl<C, const D: usize> ParameterizedCurve<C, D> {
    pub fn new(curve: Nondegenerate<C, D>, config: &ParameterizationConfig) -> Result<Self> {
        let parameterization = ArcLengthParameterization::build(&curve, config)?;
        Ok(Self {
            curve,
            parameterization,
        })
    }

    pub fn curve(&self) -> &Nondegenerate<C, D> {
        &self.curve
    }

    pub fn parameterization(&self) -> &ArcLengthParameterization {
        &self.parameterization
    }

    pub fn arc_length(&self) -> Length {
        self.parameterization.total_length()
    }

    /// Curve parameter at distance `length` from the start.
    pub fn parameter_along(&self, length: Length) -> f64 {
        self.parameterization.arc_length_to_parameter_value(length)
    }

    /// Point at distance `length` from the start. Zero (or less) gives the
    /// start point and the full arc length (or more) the end point, both
    /// exactly.
    pub fn point_along(&self, length: Length) -> Point<C, D> {
        let s = length.in_meters();
        if !(s > 0.0) {
            self.curve.start_point()
        } else if s >= self.arc_length().in_meters() {
            self.curve.end_point()
        } else {
            self.curve.point_on(self.parameter_along(length))
        }
    }

    pub fn tangent_direction_along(&self, length: Length) -> Direction<C, D> {
        self.curve.tangent_direction(self.parameter_along(length))
    }

    pub fn sample_along(&self, length: Length) -> (Point<C, D>, Direction<C, D>) {
        (self.point_along(length), self.tangent_direction_along(length))
    }

    /// Point halfway along the curve by length.
    pub fn midpoint(&self) -> Point<C, D> {
        self.point_along(self.arc_length() / 2.0)
    }

    /// `count + 1` points spaced equally by arc length, including both ends.
    pub fn points_along(&self, count: usize) -> Vec<Point<C, D>> {
        let count = count.max(1);
        let total = self.arc_length();
        (0..=count)
            .map(|i| {
                if i == count {
                    self.curve.end_point()
                } else {
                    self.point_along(total * (i as f64 / count as f64))
                }
            })
            .collect()
    }

    /// The same path traversed backwards; reuses the table.
    pub fn reverse(&self) -> Self {
        Self {
            curve: self.curve.reverse(),
            parameterization: self.parameterization.reversed(),
        }
    }
}

impl<C, const D: usize> Clone for ParameterizedCurve<C, D> {
    fn clone(&self) -> Self {
        Self {
            curve: self.curve.clone(),
            parameterization: self.parameterization.clone(),
        }
    }
}

impl<C, const D: usize> fmt::Debug for ParameterizedCurve<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterizedCurve")
            .field("curve", &self.curve)
            .field("arc_length", &self.arc_length())
            .field("samples", &self.parameterization.samples().len())
            .finish()
    }
}

/// Arc-length view of an arbitrary curve.
///
/// Degenerate curves have no tangent and therefore no parameterization;
/// they are kept as the single point they occupy, with zero length.
pub enum ArcLengthCurve<C, const D: usize> {
    Parameterized(ParameterizedCurve<C, D>),
    Point(Point<C, D>),
}

impl<C, const D: usize> ArcLengthCurve<C, D> {
    /// Parameterize `curve`, falling back to a point for degenerate curves.
    pub fn new(curve: &Curve<C, D>, config: &ParameterizationConfig) -> Result<Self> {
        curve.arc_length_curve(config)
    }

    pub fn is_point(&self) -> bool {
        matches!(self, ArcLengthCurve::Point(_))
    }

    pub fn parameterized(&self) -> Option<&ParameterizedCurve<C, D>> {
        match self {
            ArcLengthCurve::Parameterized(curve) => Some(curve),
            ArcLengthCurve::Point(_) => None,
        }
    }

    pub fn arc_length(&self) -> Length {
        match self {
            ArcLengthCurve::Parameterized(curve) => curve.arc_length(),
            ArcLengthCurve::Point(_) => Length::zero(),
        }
    }

    pub fn point_along(&self, length: Length) -> Point<C, D> {
        match self {
            ArcLengthCurve::Parameterized(curve) => curve.point_along(length),
            ArcLengthCurve::Point(point) => *point,
        }
    }

    pub fn start_point(&self) -> Point<C, D> {
        match self {
            ArcLengthCurve::Parameterized(curve) => curve.curve().start_point(),
            ArcLengthCurve::Point(point) => *point,
        }
    }

    pub fn end_point(&self) -> Point<C, D> {
        match self {
            ArcLengthCurve::Parameterized(curve) => curve.curve().end_point(),
            ArcLengthCurve::Point(point) => *point,
        }
    }

    pub fn midpoint(&self) -> Point<C, D> {
        match self {
            ArcLengthCurve::Parameterized(curve) => curve.midpoint(),
            ArcLengthCurve::Point(point) => *point,
        }
    }

    /// Tangent at distance `length`; `None` for a point.
    pub fn tangent_direction_along(&self, length: Length) -> Option<Direction<C, D>> {
        self.parameterized()
            .map(|curve| curve.tangent_direction_along(length))
    }

    pub fn reverse(&self) -> Self {
        match self {
            ArcLengthCurve::Parameterized(curve) => ArcLengthCurve::Parameterized(curve.reverse()),
            ArcLengthCurve::Point(point) => ArcLengthCurve::Point(*point),
        }
    }
}

impl<C, const D: usize> Clone for ArcLengthCurve<C, D> {
    fn clone(&self) -> Self {
        match self {
            ArcLengthCurve::Parameterized(curve) => ArcLengthCurve::Parameterized(curve.clone()),
            ArcLengthCurve::Point(point) => ArcLengthCurve::Point(*point),
        }
    }
}

impl<C, const D: usize> fmt::Debug for ArcLengthCurve<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcLengthCurve::Parameterized(curve) => f.debug_tuple("Parameterized").field(curve).finish(),
            ArcLengthCurve::Point(point) => f.debug_tuple("Point").field(point).finish(),
        }
    }
}
