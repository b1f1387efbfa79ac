//! B-spline curves and their decomposition into Bézier segments.
//!
//! A [`BSplineCurve`] stores a clamped or unclamped knot vector of length
//! `control_points + degree + 1`. Each non-empty knot span inside the domain
//! `[u_p, u_n]` becomes one [`BSplineSegment`], whose control points are
//! blossom values of the B-spline at the span's end knots.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bezier::{self, Coords};
use super::rational::validate_weights;
use crate::error::{CurveError, Result};
use crate::geometry::{Interval, Point, Vector};

#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "BSplineCurveData<C, D>")]
pub struct BSplineCurve<C, const D: usize> {
    degree: usize,
    control_points: Vec<Point<C, D>>,
    /// Empty for non-rational curves.
    weights: Vec<f64>,
    knots: Vec<f64>,
}

/// Unvalidated serialized form of [`BSplineCurve`].
#[derive(Deserialize)]
#[serde(bound = "")]
struct BSplineCurveData<C, const D: usize> {
    degree: usize,
    control_points: Vec<Point<C, D>>,
    #[serde(default)]
    weights: Vec<f64>,
    knots: Vec<f64>,
}

impl<C, const D: usize> TryFrom<BSplineCurveData<C, D>> for BSplineCurve<C, D> {
    type Error = CurveError;

    fn try_from(data: BSplineCurveData<C, D>) -> Result<Self> {
        Self::new(data.degree, data.control_points, data.weights, data.knots)
    }
}

impl<C, const D: usize> BSplineCurve<C, D> {
    /// Validate and build a B-spline curve. Pass an empty `weights` vector
    /// for a non-rational curve.
    pub fn new(
        degree: usize,
        control_points: Vec<Point<C, D>>,
        weights: Vec<f64>,
        knots: Vec<f64>,
    ) -> Result<Self> {
        if degree == 0 {
            return Err(CurveError::InvalidDegree(degree));
        }
        let count = control_points.len();
        if count < degree + 1 {
            return Err(CurveError::InsufficientControlPoints {
                required: degree + 1,
                actual: count,
            });
        }
        if !weights.is_empty() {
            if weights.len() != count {
                return Err(CurveError::InsufficientControlPoints {
                    required: count,
                    actual: weights.len(),
                });
            }
            validate_weights(&weights)?;
        }
        validate_knots(&knots, degree, count)?;
        Ok(Self {
            degree,
            control_points,
            weights,
            knots,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn control_points(&self) -> &[Point<C, D>] {
        &self.control_points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn is_rational(&self) -> bool {
        !self.weights.is_empty()
    }

    fn weight(&self, i: usize) -> f64 {
        self.weights.get(i).copied().unwrap_or(1.0)
    }

    /// Parameter range `[u_p, u_n]` over which the curve is defined.
    pub fn domain(&self) -> Interval {
        Interval::new(self.knots[self.degree], self.knots[self.control_points.len()])
    }

    /// Index `i` of the non-empty knot span `[u_i, u_{i+1})` containing `u`,
    /// clamped to the domain.
    fn find_span(&self, u: f64) -> usize {
        let p = self.degree;
        let n = self.control_points.len();

        if u >= self.knots[n] {
            let mut span = n - 1;
            while span > p && self.knots[span] >= self.knots[span + 1] {
                span -= 1;
            }
            return span;
        }
        if u <= self.knots[p] {
            let mut span = p;
            while span < n - 1 && self.knots[span] >= self.knots[span + 1] {
                span += 1;
            }
            return span;
        }

        let mut low = p;
        let mut high = n;
        let mut mid = (low + high) / 2;
        while u < self.knots[mid] || u >= self.knots[mid + 1] {
            if u < self.knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    /// Non-zero basis functions `N_{span-p..=span, p}(u)`.
    fn basis_functions(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let mut n_vals = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];

        n_vals[0] = 1.0;
        for j in 1..=p {
            left[j] = u - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - u;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = n_vals[r] / (right[r + 1] + left[j - r]);
                n_vals[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n_vals[j] = saved;
        }
        n_vals
    }

    /// Evaluate at knot parameter `u` by summing basis functions.
    pub fn evaluate(&self, u: f64) -> Point<C, D> {
        let span = self.find_span(u);
        let basis = self.basis_functions(span, u);
        let p = self.degree;

        let mut sum = Coords::<D>::zeros();
        let mut w_sum = 0.0;
        for (k, b) in basis.iter().enumerate() {
            let idx = span - p + k;
            let bw = b * self.weight(idx);
            sum += self.control_points[idx].coords() * bw;
            w_sum += bw;
        }
        if self.is_rational() && w_sum != 0.0 {
            sum /= w_sum;
        }
        Point::from_coords(sum)
    }

    /// Blossom of the span `i` local control points at `args` (one per level).
    fn span_blossom(&self, span: usize, args: &[f64]) -> (Coords<D>, f64) {
        let p = self.degree;
        let first = span - p;
        let mut points: Vec<Coords<D>> = self.control_points[first..=span]
            .iter()
            .map(|pt| *pt.coords())
            .collect();
        let mut weights: Vec<f64> = (first..=span).map(|i| self.weight(i)).collect();

        for (r, &x) in (1..=p).zip(args) {
            for j in (r..=p).rev() {
                let lo = self.knots[first + j];
                let hi = self.knots[span + 1 + j - r];
                let alpha = (x - lo) / (hi - lo);
                if self.is_rational() {
                    let (pt, w) =
                        bezier::rational_lerp((&points[j - 1], weights[j - 1]), (&points[j], weights[j]), alpha);
                    points[j] = pt;
                    weights[j] = w;
                } else {
                    points[j] = bezier::lerp(&points[j - 1], &points[j], alpha);
                }
            }
        }
        (points[p], weights[p])
    }

    /// One Bézier segment per non-empty knot span of the domain.
    pub fn segments(&self) -> Vec<BSplineSegment<C, D>> {
        let p = self.degree;
        let n = self.control_points.len();
        let mut segments = Vec::with_capacity(n - p);
        let mut skipped = 0usize;

        for span in p..n {
            let (a, b) = (self.knots[span], self.knots[span + 1]);
            if a >= b {
                skipped += 1;
                continue;
            }
            let mut control_points = Vec::with_capacity(p + 1);
            let mut weights = Vec::with_capacity(if self.is_rational() { p + 1 } else { 0 });
            for k in 0..=p {
                let mut args = vec![a; p - k];
                args.extend(std::iter::repeat(b).take(k));
                let (coords, w) = self.span_blossom(span, &args);
                control_points.push(Point::from_coords(coords));
                if self.is_rational() {
                    weights.push(w);
                }
            }
            segments.push(BSplineSegment {
                domain: Interval::new(a, b),
                control_points,
                weights,
            });
        }

        debug!(
            degree = p,
            segments = segments.len(),
            skipped_spans = skipped,
            "decomposed B-spline into Bézier segments"
        );
        segments
    }
}

fn validate_knots(knots: &[f64], degree: usize, count: usize) -> Result<()> {
    let expected = count + degree + 1;
    if knots.len() != expected {
        return Err(CurveError::invalid_knot_vector(format!(
            "expected {expected} knots for {count} control points of degree {degree}, got {}",
            knots.len()
        )));
    }
    if let Some(index) = knots.iter().position(|k| !k.is_finite()) {
        return Err(CurveError::invalid_knot_vector(format!(
            "knot {index} is not finite"
        )));
    }
    if let Some(index) = knots.windows(2).position(|w| w[1] < w[0]) {
        return Err(CurveError::invalid_knot_vector(format!(
            "knots decrease at index {}",
            index + 1
        )));
    }
    if knots[degree] >= knots[count] {
        return Err(CurveError::invalid_knot_vector("empty parameter domain"));
    }
    Ok(())
}

/// One Bézier piece of a B-spline, parameterized locally over `[0, 1]`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BSplineSegment<C, const D: usize> {
    /// Knot interval this segment covers.
    pub domain: Interval,
    pub control_points: Vec<Point<C, D>>,
    /// Empty for non-rational segments.
    pub weights: Vec<f64>,
}

impl<C, const D: usize> BSplineSegment<C, D> {
    pub fn is_rational(&self) -> bool {
        !self.weights.is_empty()
    }

    fn coords(&self) -> Vec<Coords<D>> {
        bezier::coords_of(&self.control_points)
    }

    pub fn point_on(&self, t: f64) -> Point<C, D> {
        if self.is_rational() {
            Point::from_coords(bezier::rational_de_casteljau(&self.coords(), &self.weights, t))
        } else {
            bezier::point_on(&self.control_points, t)
        }
    }

    /// First derivative with respect to the local parameter `t`.
    pub fn derivative(&self, t: f64) -> Vector<C, D> {
        if self.is_rational() {
            let derivatives = bezier::rational_derivatives(&self.coords(), &self.weights, 1, t);
            Vector::from_components(derivatives.last().copied().unwrap_or_else(Coords::zeros))
        } else {
            bezier::nth_derivative(&self.control_points, 1, t)
        }
    }

    pub fn start_point(&self) -> Point<C, D> {
        self.point_on(0.0)
    }

    pub fn end_point(&self) -> Point<C, D> {
        self.point_on(1.0)
    }

    pub fn start_derivative(&self) -> Vector<C, D> {
        self.derivative(0.0)
    }

    pub fn end_derivative(&self) -> Vector<C, D> {
        self.derivative(1.0)
    }
}

/// Convert a segment's control point list into a fixed-size array.
pub(crate) fn fixed_control_points<C, const D: usize, const N: usize>(
    points: Vec<Point<C, D>>,
) -> Result<[Point<C, D>; N]> {
    <[Point<C, D>; N]>::try_from(points).map_err(|points| CurveError::InsufficientControlPoints {
        required: N,
        actual: points.len(),
    })
}

impl<C, const D: usize> Clone for BSplineCurve<C, D> {
    fn clone(&self) -> Self {
        Self {
            degree: self.degree,
            control_points: self.control_points.clone(),
            weights: self.weights.clone(),
            knots: self.knots.clone(),
        }
    }
}

impl<C, const D: usize> fmt::Debug for BSplineCurve<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BSplineCurve")
            .field("degree", &self.degree)
            .field("control_points", &self.control_points)
            .field("weights", &self.weights)
            .field("knots", &self.knots)
            .finish()
    }
}

impl<C, const D: usize> Clone for BSplineSegment<C, D> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            control_points: self.control_points.clone(),
            weights: self.weights.clone(),
        }
    }
}

impl<C, const D: usize> PartialEq for BSplineSegment<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
            && self.control_points == other.control_points
            && self.weights == other.weights
    }
}

impl<C, const D: usize> fmt::Debug for BSplineSegment<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BSplineSegment")
            .field("domain", &self.domain)
            .field("control_points", &self.control_points)
            .field("weights", &self.weights)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2d, Point3d};
    use approx::assert_abs_diff_eq;

    enum World {}

    fn wavy_cubic() -> BSplineCurve<World, 3> {
        BSplineCurve::new(
            3,
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 2.0, 0.0),
                Point3d::new(2.0, -1.0, 1.0),
                Point3d::new(3.0, 2.0, 1.0),
                Point3d::new(4.0, 0.0, -1.0),
                Point3d::new(5.0, 1.0, 0.0),
            ],
            Vec::new(),
            vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    fn circle_quadrant() -> BSplineCurve<World, 2> {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        BSplineCurve::new(
            2,
            vec![
                Point2d::new(1.0, 0.0),
                Point2d::new(1.0, 1.0),
                Point2d::new(0.0, 1.0),
                Point2d::new(-1.0, 1.0),
                Point2d::new(-1.0, 0.0),
            ],
            vec![1.0, w, 1.0, w, 1.0],
            vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_input() {
        let points = vec![Point2d::<World>::new(0.0, 0.0), Point2d::new(1.0, 0.0)];
        assert!(matches!(
            BSplineCurve::new(0, points.clone(), Vec::new(), vec![0.0, 0.0, 1.0]),
            Err(CurveError::InvalidDegree(0))
        ));
        assert!(matches!(
            BSplineCurve::new(2, points.clone(), Vec::new(), vec![0.0; 5]),
            Err(CurveError::InsufficientControlPoints { required: 3, actual: 2 })
        ));
        assert!(matches!(
            BSplineCurve::new(1, points.clone(), Vec::new(), vec![0.0, 1.0, 1.0]),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BSplineCurve::new(1, points.clone(), Vec::new(), vec![0.0, 1.0, 0.5, 1.0]),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BSplineCurve::new(1, points.clone(), Vec::new(), vec![0.0, f64::NAN, 1.0, 1.0]),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BSplineCurve::new(1, points.clone(), Vec::new(), vec![1.0, 1.0, 1.0, 1.0]),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BSplineCurve::new(1, points, vec![1.0, -2.0], vec![0.0, 0.0, 1.0, 1.0]),
            Err(CurveError::InvalidWeight { index: 1, .. })
        ));
    }

    #[test]
    fn test_domain_and_span_count() {
        let curve = wavy_cubic();
        assert_eq!(curve.domain(), Interval::new(0.0, 1.0));
        let segments = curve.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].domain, Interval::new(0.0, 0.3));
        assert_eq!(segments[2].domain, Interval::new(0.7, 1.0));
    }

    #[test]
    fn test_clamped_ends_interpolate() {
        let curve = wavy_cubic();
        let segments = curve.segments();
        assert_eq!(segments[0].start_point(), curve.control_points()[0]);
        assert_eq!(segments[2].end_point(), curve.control_points()[5]);
        assert_abs_diff_eq!(curve.evaluate(0.0), curve.control_points()[0], epsilon = 1e-14);
        assert_abs_diff_eq!(curve.evaluate(1.0), curve.control_points()[5], epsilon = 1e-14);
    }

    #[test]
    fn test_segments_match_de_boor() {
        let curve = wavy_cubic();
        for segment in curve.segments() {
            for k in 0..=10 {
                let t = k as f64 / 10.0;
                let u = segment.domain.interpolate(t);
                assert_abs_diff_eq!(segment.point_on(t), curve.evaluate(u), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_segments_are_c2_for_simple_knots() {
        let segments = wavy_cubic().segments();
        for pair in segments.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            assert_abs_diff_eq!(left.end_point(), right.start_point(), epsilon = 1e-12);
            let left_rate = left.end_derivative() / left.domain.width();
            let right_rate = right.start_derivative() / right.domain.width();
            assert_abs_diff_eq!(left_rate, right_rate, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rational_segments_lie_on_circle() {
        let curve = circle_quadrant();
        let segments = curve.segments();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(BSplineSegment::is_rational));
        for segment in &segments {
            for k in 0..=16 {
                let t = k as f64 / 16.0;
                let p = segment.point_on(t);
                assert_abs_diff_eq!(p.distance_to(&Point2d::origin()).value(), 1.0, epsilon = 1e-12);
                let u = segment.domain.interpolate(t);
                assert_abs_diff_eq!(p, curve.evaluate(u), epsilon = 1e-12);
            }
        }
        assert_eq!(segments[0].end_point(), Point2d::new(0.0, 1.0));
    }

    #[test]
    fn test_unclamped_knots() {
        let curve = BSplineCurve::<World, 2>::new(
            2,
            vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 1.0),
                Point2d::new(2.0, 0.0),
                Point2d::new(3.0, 1.0),
            ],
            Vec::new(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        assert_eq!(curve.domain(), Interval::new(2.0, 4.0));
        let segments = curve.segments();
        assert_eq!(segments.len(), 2);
        // Uniform quadratic: segment ends at the midpoint of a control leg.
        assert_abs_diff_eq!(segments[0].start_point(), Point2d::new(0.5, 0.5), epsilon = 1e-14);
        assert_abs_diff_eq!(segments[1].start_point(), Point2d::new(1.5, 0.5), epsilon = 1e-14);
    }

    #[test]
    fn test_fixed_control_points() {
        let points = vec![Point2d::<World>::new(0.0, 0.0), Point2d::new(1.0, 0.0)];
        let fixed: [Point2d<World>; 2] = fixed_control_points(points.clone()).unwrap();
        assert_eq!(fixed[1], points[1]);
        assert!(matches!(
            fixed_control_points::<World, 2, 3>(points),
            Err(CurveError::InsufficientControlPoints { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let curve = wavy_cubic();
        let json = serde_json::to_value(&curve).unwrap();
        let restored: BSplineCurve<World, 3> = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored.knots(), curve.knots());

        let mut short_knots = json.clone();
        short_knots["knots"] = serde_json::json!([0.0, 1.0]);
        assert!(serde_json::from_value::<BSplineCurve<World, 3>>(short_knots).is_err());

        let mut decreasing = json.clone();
        decreasing["knots"] = serde_json::json!([0.0, 0.0, 0.0, 0.0, 0.7, 0.3, 1.0, 1.0, 1.0, 1.0]);
        assert!(serde_json::from_value::<BSplineCurve<World, 3>>(decreasing).is_err());

        let mut bad_weights = json;
        bad_weights["weights"] = serde_json::json!([1.0, 1.0, -1.0, 1.0, 1.0, 1.0]);
        assert!(serde_json::from_value::<BSplineCurve<World, 3>>(bad_weights).is_err());
    }
}
