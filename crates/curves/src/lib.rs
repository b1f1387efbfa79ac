#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod arclength;
pub mod curves;
pub mod error;
pub mod geometry;
pub mod validation;

// Re-export key types at crate root for convenience.
pub use arclength::{
    ArcLengthCurve, ArcLengthParameterization, ParameterizationConfig, ParameterizedCurve,
};
pub use curves::{
    BSplineCurve, BSplineSegment, CubicSpline, Curve, CurveEval, Degenerate, DegeneracyKind,
    EllipticalArc, Nondegenerate, QuadraticSpline, RationalCubicSpline, Spline,
};
pub use error::{CurveError, Result};
pub use geometry::{
    Angle, BoundingBox, Direction, Frame, Interval, Length, Point, Quantity, SketchPlane, Vector,
    VectorBox,
};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (meters).
    pub coincidence: f64,
    /// Allowed mismatch between width-scaled derivatives at a segment joint.
    pub derivative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-9,
            derivative: 1e-7,
        }
    }
}
