use std::fmt;

use serde::{Deserialize, Serialize};

use super::nondegenerate::{Degenerate, DegeneracyKind, Nondegenerate};
use super::{Curve, CurveEval};
use crate::error::{CurveError, Result};
use crate::geometry::quantity::interpolate_scalar;
use crate::geometry::{
    Angle, BoundingBox, Direction, Direction2d, Frame, Interval, Length, Point, Point2d,
    SketchPlane, Vector, VectorBox,
};

const PERPENDICULAR_TOLERANCE: f64 = 1e-9;

/// Tangent triangles are only used for sub-arcs sweeping at most a quarter turn.
const MAX_TANGENT_HALF_ANGLE: f64 = std::f64::consts::FRAC_PI_4;

/// An arc of an ellipse: `center + rx cos(θ) x̂ + ry sin(θ) ŷ` for `θ`
/// running from the start angle to the end angle.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EllipticalArc<C, const D: usize> {
    center: Point<C, D>,
    x_direction: Direction<C, D>,
    y_direction: Direction<C, D>,
    x_radius: Length,
    y_radius: Length,
    start_angle: Angle,
    end_angle: Angle,
}

impl<C, const D: usize> EllipticalArc<C, D> {
    /// Fails with [`CurveError::InvalidFrame`] if the axis directions are not
    /// perpendicular.
    pub fn new(
        center: Point<C, D>,
        x_direction: Direction<C, D>,
        y_direction: Direction<C, D>,
        x_radius: Length,
        y_radius: Length,
        start_angle: Angle,
        swept_angle: Angle,
    ) -> Result<Self> {
        let dot = x_direction.components().dot(&y_direction.components());
        if dot.abs() > PERPENDICULAR_TOLERANCE {
            return Err(CurveError::invalid_frame("ellipse axes are not perpendicular"));
        }
        Ok(Self {
            center,
            x_direction,
            y_direction,
            x_radius,
            y_radius,
            start_angle,
            end_angle: start_angle + swept_angle,
        })
    }

    pub fn center(&self) -> Point<C, D> {
        self.center
    }

    pub fn x_direction(&self) -> Direction<C, D> {
        self.x_direction
    }

    pub fn y_direction(&self) -> Direction<C, D> {
        self.y_direction
    }

    pub fn x_radius(&self) -> Length {
        self.x_radius
    }

    pub fn y_radius(&self) -> Length {
        self.y_radius
    }

    pub fn start_angle(&self) -> Angle {
        self.start_angle
    }

    pub fn end_angle(&self) -> Angle {
        self.end_angle
    }

    pub fn swept_angle(&self) -> Angle {
        self.end_angle - self.start_angle
    }

    pub fn is_circular(&self) -> bool {
        self.x_radius.abs() == self.y_radius.abs()
    }

    fn angle_at(&self, t: f64) -> f64 {
        interpolate_scalar(self.start_angle.in_radians(), self.end_angle.in_radians(), t)
    }

    /// Point halfway along the sweep.
    pub fn midpoint(&self) -> Point<C, D> {
        self.point_on(0.5)
    }

    pub fn reverse(&self) -> Self {
        Self {
            start_angle: self.end_angle,
            end_angle: self.start_angle,
            ..*self
        }
    }

    /// Split the sweep at parameter `t`.
    pub fn split_at(&self, t: f64) -> (Self, Self) {
        let split_angle = Angle::radians(self.angle_at(t));
        (
            Self {
                end_angle: split_angle,
                ..*self
            },
            Self {
                start_angle: split_angle,
                ..*self
            },
        )
    }

    pub fn bisect(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> EllipticalArc<L, D> {
        EllipticalArc {
            center: self.center.relative_to(frame),
            x_direction: self.x_direction.relative_to(frame),
            y_direction: self.y_direction.relative_to(frame),
            x_radius: self.x_radius,
            y_radius: self.y_radius,
            start_angle: self.start_angle,
            end_angle: self.end_angle,
        }
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> EllipticalArc<G, D> {
        EllipticalArc {
            center: self.center.place_in(frame),
            x_direction: self.x_direction.place_in(frame),
            y_direction: self.y_direction.place_in(frame),
            x_radius: self.x_radius,
            y_radius: self.y_radius,
            start_angle: self.start_angle,
            end_angle: self.end_angle,
        }
    }

    pub(crate) fn degeneracy(&self) -> Option<Degenerate<C, D>> {
        if self.end_angle == self.start_angle {
            Some(Degenerate::new(DegeneracyKind::ZeroSweep, self.point_on(0.0)))
        } else if self.x_radius.is_zero() && self.y_radius.is_zero() {
            Some(Degenerate::new(DegeneracyKind::ZeroRadii, self.center))
        } else {
            None
        }
    }

    pub fn nondegenerate(&self) -> std::result::Result<Nondegenerate<C, D>, Degenerate<C, D>> {
        Curve::from(*self).nondegenerate()
    }

    /// Coefficients of x̂ and ŷ in the `n`-th derivative, before the `Δθⁿ`
    /// factor. Each derivative rotates the phase by a quarter turn.
    fn phase_coefficients(&self, n: usize, cos: f64, sin: f64) -> (f64, f64) {
        let (rx, ry) = (self.x_radius.in_meters(), self.y_radius.in_meters());
        match n % 4 {
            0 => (rx * cos, ry * sin),
            1 => (-rx * sin, ry * cos),
            2 => (-rx * cos, -ry * sin),
            _ => (rx * sin, -ry * cos),
        }
    }
}

impl<C> EllipticalArc<C, 2> {
    /// Planar arc; the y direction is the x direction turned a quarter turn
    /// counterclockwise.
    pub fn with_x_direction(
        center: Point2d<C>,
        x_direction: Direction2d<C>,
        x_radius: Length,
        y_radius: Length,
        start_angle: Angle,
        swept_angle: Angle,
    ) -> Self {
        Self {
            center,
            x_direction,
            y_direction: x_direction.perpendicular(),
            x_radius,
            y_radius,
            start_angle,
            end_angle: start_angle + swept_angle,
        }
    }

    /// Circular arc with axes aligned to the coordinate axes.
    pub fn circular(center: Point2d<C>, radius: Length, start_angle: Angle, swept_angle: Angle) -> Self {
        Self::with_x_direction(center, Direction2d::x(), radius, radius, start_angle, swept_angle)
    }

    pub fn on<G>(&self, plane: &SketchPlane<G, C>) -> EllipticalArc<G, 3> {
        EllipticalArc {
            center: plane.place(&self.center),
            x_direction: Direction::unchecked(
                plane.place_vector(&self.x_direction.to_vector()).components(),
            ),
            y_direction: Direction::unchecked(
                plane.place_vector(&self.y_direction.to_vector()).components(),
            ),
            x_radius: self.x_radius,
            y_radius: self.y_radius,
            start_angle: self.start_angle,
            end_angle: self.end_angle,
        }
    }
}

impl<C, const D: usize> CurveEval<C, D> for EllipticalArc<C, D> {
    fn point_on(&self, t: f64) -> Point<C, D> {
        self.center + self.nth_derivative(0, t)
    }

    /// `Δθⁿ (rx cos(θ + nπ/2) x̂ + ry sin(θ + nπ/2) ŷ)`; the zeroth
    /// derivative is the offset from the center.
    fn nth_derivative(&self, n: usize, t: f64) -> Vector<C, D> {
        let theta = self.angle_at(t);
        let (a, b) = self.phase_coefficients(n, theta.cos(), theta.sin());
        let scale = self.swept_angle().in_radians().powi(n as i32);
        (self.x_direction * a + self.y_direction * b) * scale
    }

    fn derivative_bounding_box(&self, order: usize, domain: Interval) -> VectorBox<C, D> {
        let theta = Interval::new(self.angle_at(domain.min()), self.angle_at(domain.max()));
        let (rx, ry) = (self.x_radius.in_meters(), self.y_radius.in_meters());
        let (cos, sin) = (theta.cos(), theta.sin());
        let (a, b) = match order % 4 {
            0 => (cos * rx, sin * ry),
            1 => (sin * -rx, cos * ry),
            2 => (cos * -rx, sin * -ry),
            _ => (sin * rx, cos * -ry),
        };
        let scale = self.swept_angle().in_radians().powi(order as i32);
        VectorBox::new(std::array::from_fn(|i| {
            (a * self.x_direction.component(i) + b * self.y_direction.component(i)) * scale
        }))
    }

    fn bounding_box(&self) -> BoundingBox<C, D> {
        BoundingBox::from_offsets(&self.center, &self.derivative_bounding_box(0, Interval::unit()))
    }

    /// Length of the tangent triangle: the control polygon of the arc written
    /// as a rational quadratic with middle weight `cos(h)`, where `h` is half
    /// the swept angle over `domain`.
    fn length_upper_bound(&self, domain: Interval) -> Option<Length> {
        let (a, b) = (self.angle_at(domain.min()), self.angle_at(domain.max()));
        let half = (b - a) / 2.0;
        if !(half.abs() <= MAX_TANGENT_HALF_ANGLE) {
            return None;
        }
        let mid = a + half;
        let cos_half = half.cos();
        let (rx, ry) = (self.x_radius.in_meters(), self.y_radius.in_meters());
        let apex = self.center
            + self.x_direction * (rx * mid.cos() / cos_half)
            + self.y_direction * (ry * mid.sin() / cos_half);
        let start = self.point_on(domain.min());
        let end = self.point_on(domain.max());
        Some(start.distance_to(&apex) + apex.distance_to(&end))
    }
}

impl<C, const D: usize> Clone for EllipticalArc<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for EllipticalArc<C, D> {}

impl<C, const D: usize> PartialEq for EllipticalArc<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center
            && self.x_direction == other.x_direction
            && self.y_direction == other.y_direction
            && self.x_radius == other.x_radius
            && self.y_radius == other.y_radius
            && self.start_angle == other.start_angle
            && self.end_angle == other.end_angle
    }
}

impl<C, const D: usize> fmt::Debug for EllipticalArc<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EllipticalArc")
            .field("center", &self.center)
            .field("x_direction", &self.x_direction)
            .field("y_direction", &self.y_direction)
            .field("x_radius", &self.x_radius)
            .field("y_radius", &self.y_radius)
            .field("start_angle", &self.start_angle)
            .field("end_angle", &self.end_angle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction3d, Point3d, Vector2d};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    enum World {}
    enum Sketch {}

    fn quarter_ellipse() -> EllipticalArc<World, 2> {
        EllipticalArc::with_x_direction(
            Point2d::new(1.0, 1.0),
            Direction2d::x(),
            Length::meters(3.0),
            Length::meters(2.0),
            Angle::zero(),
            Angle::radians(FRAC_PI_2),
        )
    }

    #[test]
    fn test_endpoints() {
        let arc = quarter_ellipse();
        assert_eq!(arc.start_point(), Point2d::new(4.0, 1.0));
        assert_abs_diff_eq!(arc.end_point(), Point2d::new(1.0, 3.0), epsilon = 1e-15);
    }

    #[test]
    fn test_midpoint() {
        let arc = quarter_ellipse();
        assert_eq!(arc.midpoint(), arc.point_on(0.5));
        let c = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(arc.midpoint(), Point2d::new(1.0 + 3.0 * c, 1.0 + 2.0 * c), epsilon = 1e-14);
    }

    #[test]
    fn test_derivatives() {
        let arc = quarter_ellipse();
        assert_abs_diff_eq!(arc.first_derivative(0.0), Vector2d::new(0.0, 2.0 * FRAC_PI_2), epsilon = 1e-15);
        assert_abs_diff_eq!(
            arc.second_derivative(0.0),
            Vector2d::new(-3.0 * FRAC_PI_2 * FRAC_PI_2, 0.0),
            epsilon = 1e-14
        );
        let h = 1e-6;
        let t = 0.37;
        let numeric = (arc.point_on(t + h) - arc.point_on(t - h)) / (2.0 * h);
        assert_abs_diff_eq!(arc.first_derivative(t), numeric, epsilon = 1e-7);
    }

    #[test]
    fn test_derivative_boxes_contain_samples() {
        let arc = EllipticalArc::<World, 2>::with_x_direction(
            Point2d::new(0.0, 0.0),
            Direction2d::from_angle(Angle::degrees(20.0)),
            Length::meters(2.0),
            Length::meters(0.5),
            Angle::degrees(-40.0),
            Angle::degrees(300.0),
        );
        for order in 0..4 {
            for domain in [Interval::unit(), Interval::new(0.1, 0.2), Interval::new(0.6, 0.95)] {
                let b = arc.derivative_bounding_box(order, domain);
                for k in 0..=25 {
                    let t = domain.interpolate(k as f64 / 25.0);
                    let d = arc.nth_derivative(order, t);
                    for i in 0..2 {
                        let c = b.component(i);
                        assert!(c.min() - 1e-9 <= d.component(i) && d.component(i) <= c.max() + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bounding_box_full_circle() {
        let circle = EllipticalArc::<World, 2>::circular(
            Point2d::new(1.0, -1.0),
            Length::meters(2.0),
            Angle::zero(),
            Angle::full_turn(),
        );
        let bb = circle.bounding_box();
        assert_abs_diff_eq!(bb.min, Point2d::new(-1.0, -3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max, Point2d::new(3.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_reverse_and_split() {
        let arc = quarter_ellipse();
        let reversed = arc.reverse();
        assert_eq!(reversed.start_point(), arc.end_point());
        assert_eq!(reversed.end_point(), arc.start_point());
        assert_eq!(reversed.reverse(), arc);

        let (left, right) = arc.split_at(0.25);
        assert_eq!(left.end_point(), right.start_point());
        assert_abs_diff_eq!(left.point_on(0.5), arc.point_on(0.125), epsilon = 1e-14);
        assert_abs_diff_eq!(right.point_on(0.5), arc.point_on(0.625), epsilon = 1e-14);
    }

    #[test]
    fn test_tangent_triangle_bound() {
        let circle = EllipticalArc::<World, 2>::circular(
            Point2d::origin(),
            Length::meters(2.0),
            Angle::zero(),
            Angle::full_turn(),
        );
        // A quarter of the circle: tangent lines meet at distance 2 from both ends.
        let quarter = circle.length_upper_bound(Interval::new(0.0, 0.25)).unwrap();
        assert_abs_diff_eq!(quarter.in_meters(), 4.0, epsilon = 1e-12);
        assert!(circle.length_upper_bound(Interval::new(0.0, 0.5)).is_none());

        let arc = quarter_ellipse();
        let bound = arc.length_upper_bound(Interval::new(0.2, 0.6)).unwrap().in_meters();
        let n = 1000;
        let polyline: f64 = (0..n)
            .map(|k| {
                let t0 = 0.2 + 0.4 * k as f64 / n as f64;
                let t1 = 0.2 + 0.4 * (k + 1) as f64 / n as f64;
                arc.point_on(t0).distance_to(&arc.point_on(t1)).in_meters()
            })
            .sum();
        assert!(polyline <= bound);
    }

    #[test]
    fn test_rejects_skew_axes() {
        let skew = Vector2d::<World>::new(1.0, 1.0).direction().unwrap();
        let result = EllipticalArc::new(
            Point2d::origin(),
            Direction2d::x(),
            skew,
            Length::meters(1.0),
            Length::meters(1.0),
            Angle::zero(),
            Angle::half_turn(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_on_sketch_plane() {
        let plane = SketchPlane::<World, Sketch>::new(
            Point3d::new(0.0, 0.0, 5.0),
            Direction3d::y(),
            Direction3d::z(),
        )
        .unwrap();
        let arc = EllipticalArc::<Sketch, 2>::circular(
            Point2d::origin(),
            Length::meters(1.0),
            Angle::zero(),
            Angle::radians(PI),
        );
        let spatial = arc.on(&plane);
        assert_eq!(spatial.start_point(), Point3d::new(0.0, 1.0, 5.0));
        assert_abs_diff_eq!(spatial.end_point(), Point3d::new(0.0, -1.0, 5.0), epsilon = 1e-15);
        assert_abs_diff_eq!(spatial.midpoint(), Point3d::new(0.0, 0.0, 6.0), epsilon = 1e-15);
    }
}
