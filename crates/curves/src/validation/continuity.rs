//! Continuity checks across the joints of a Bézier segment chain.
//!
//! G0 (positional) gap, C1 mismatch of the knot-parameter derivatives, and
//! the G1 angle between tangents, at every pair of adjacent segments.

use tracing::debug;

use crate::curves::BSplineSegment;
use crate::Tolerance;

/// Metrics for the joint between segment `index` and segment `index + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMetrics {
    pub index: usize,
    pub g0_gap: f64,
    /// Difference of the derivatives with respect to the knot parameter.
    pub c1_mismatch: f64,
    /// Angle between tangents in radians; zero when either side has zero
    /// speed.
    pub g1_angle: f64,
}

#[derive(Debug, Clone)]
pub struct ChainContinuityReport {
    pub joints: Vec<JointMetrics>,
    pub max_g0_gap: f64,
    pub max_c1_mismatch: f64,
    pub max_g1_angle: f64,
    tolerance: Tolerance,
}

impl ChainContinuityReport {
    pub fn is_c0(&self) -> bool {
        self.max_g0_gap <= self.tolerance.coincidence
    }

    pub fn is_c1(&self) -> bool {
        self.is_c0() && self.max_c1_mismatch <= self.tolerance.derivative
    }

    /// Joints whose positional gap exceeds the coincidence tolerance.
    pub fn gaps(&self) -> impl Iterator<Item = &JointMetrics> {
        let limit = self.tolerance.coincidence;
        self.joints.iter().filter(move |joint| joint.g0_gap > limit)
    }
}

/// Measure continuity at every joint of `segments`, in order.
pub fn check_chain<C, const D: usize>(
    segments: &[BSplineSegment<C, D>],
    tolerance: &Tolerance,
) -> ChainContinuityReport {
    let mut joints = Vec::with_capacity(segments.len().saturating_sub(1));
    let mut max_g0 = 0.0f64;
    let mut max_c1 = 0.0f64;
    let mut max_g1 = 0.0f64;

    for (index, pair) in segments.windows(2).enumerate() {
        let (left, right) = (&pair[0], &pair[1]);

        let g0_gap = left.end_point().distance_to(&right.start_point()).in_meters();

        let left_derivative = left.end_derivative();
        let right_derivative = right.start_derivative();
        let left_rate = left_derivative / left.domain.width();
        let right_rate = right_derivative / right.domain.width();
        let c1_mismatch = (left_rate - right_rate).magnitude().in_meters();

        let g1_angle = match (left_derivative.direction(), right_derivative.direction()) {
            (Some(a), Some(b)) => a.angle_to(&b).in_radians(),
            _ => 0.0,
        };

        max_g0 = max_g0.max(g0_gap);
        max_c1 = max_c1.max(c1_mismatch);
        max_g1 = max_g1.max(g1_angle);
        joints.push(JointMetrics {
            index,
            g0_gap,
            c1_mismatch,
            g1_angle,
        });
    }

    debug!(
        joints = joints.len(),
        max_g0_gap = max_g0,
        max_c1_mismatch = max_c1,
        "checked segment chain continuity"
    );

    ChainContinuityReport {
        joints,
        max_g0_gap: max_g0,
        max_c1_mismatch: max_c1,
        max_g1_angle: max_g1,
        tolerance: *tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::BSplineCurve;
    use crate::geometry::{Interval, Point2d};

    enum World {}

    fn points() -> Vec<Point2d<World>> {
        vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(2.0, -1.0),
            Point2d::new(3.0, 2.0),
            Point2d::new(4.0, 0.0),
            Point2d::new(5.0, 1.0),
        ]
    }

    #[test]
    fn test_simple_knots_are_c1() {
        let curve = BSplineCurve::new(
            3,
            points(),
            Vec::new(),
            vec![0.0, 0.0, 0.0, 0.0, 0.2, 0.7, 1.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let report = check_chain(&curve.segments(), &Tolerance::default());
        assert_eq!(report.joints.len(), 2);
        assert!(report.is_c0());
        assert!(report.is_c1());
        assert!(report.max_g1_angle < 1e-6);
        assert_eq!(report.gaps().count(), 0);
    }

    #[test]
    fn test_full_multiplicity_knot_breaks_c1() {
        // A double knot in a quadratic leaves only C0 at the joint.
        let curve = BSplineCurve::new(
            2,
            points(),
            Vec::new(),
            vec![0.0, 0.0, 0.0, 0.3, 0.5, 0.5, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let segments = curve.segments();
        assert_eq!(segments.len(), 3);
        let report = check_chain(&segments, &Tolerance::default());
        assert!(report.is_c0());
        assert!(!report.is_c1());
        assert!(report.max_g1_angle > 0.1);
    }

    #[test]
    fn test_detects_gap() {
        let curve = BSplineCurve::new(
            2,
            points(),
            Vec::new(),
            vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let mut segments = curve.segments();
        segments[2].control_points[0] = Point2d::new(10.0, 10.0);
        let report = check_chain(&segments, &Tolerance::default());
        assert!(!report.is_c0());
        assert!(!report.is_c1());
        let gaps: Vec<usize> = report.gaps().map(|joint| joint.index).collect();
        assert_eq!(gaps, vec![1]);
    }

    #[test]
    fn test_empty_and_single_segment() {
        let report = check_chain::<World, 2>(&[], &Tolerance::default());
        assert!(report.joints.is_empty());
        assert!(report.is_c1());

        let single = BSplineSegment {
            domain: Interval::unit(),
            control_points: vec![Point2d::<World>::new(0.0, 0.0), Point2d::new(1.0, 1.0)],
            weights: Vec::new(),
        };
        assert!(check_chain(&[single], &Tolerance::default()).joints.is_empty());
    }
}
