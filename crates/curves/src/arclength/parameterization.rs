//! Adaptive construction of the parameter/arc-length table.
//!
//! `[0, 1]` is cut into intervals on an explicit stack, leftmost first. For
//! each interval the first-derivative box gives a lower bound (min speed
//! times width, or the chord if longer) and an upper bound (max speed times
//! width, or the family's own bound if shorter) on its length. An interval is
//! accepted once `upper - lower` fits the error budget earned so far, which
//! grows linearly with the parameter: after reaching `b`, the total error
//! spent may be at most `max_error * b`. Unspent budget carries forward.
//!
//! The recorded length of an accepted interval is a 5-point Gauss-Legendre
//! estimate clamped into `[lower, upper]`, so its error never exceeds the
//! width of the bounds.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::config::ParameterizationConfig;
use crate::curves::{CurveEval, Nondegenerate};
use crate::error::{CurveError, Result};
use crate::geometry::{Interval, Length};

// ── Quadrature ─────────────────────────────────────────────────

const GAUSS_NODES: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683_1,
    0.0,
    0.538_469_310_105_683_1,
    0.906_179_845_938_664,
];

const GAUSS_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189_1,
    0.478_628_670_499_366_5,
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_5,
    0.236_926_885_056_189_1,
];

/// Upper limit on the uniform seeding depth, whatever `max_depth` is.
const MAX_SEED_DEPTH: u32 = 10;

fn gauss_length<C, const D: usize>(curve: &impl CurveEval<C, D>, domain: &Interval) -> f64 {
    let half = domain.width() / 2.0;
    let mid = domain.midpoint();
    let sum: f64 = GAUSS_NODES
        .iter()
        .zip(GAUSS_WEIGHTS)
        .map(|(&x, w)| w * curve.first_derivative(mid + half * x).magnitude().in_meters())
        .sum();
    sum * half
}

// ── Table ──────────────────────────────────────────────────────

/// One row of the table: cumulative arc length at a curve parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcLengthSample {
    pub parameter: f64,
    pub length: Length,
}

/// Monotonic mapping between curve parameter and cumulative arc length.
///
/// The first row is always `(0, 0)` and the last `(1, total)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterizationData")]
pub struct ArcLengthParameterization {
    samples: Vec<ArcLengthSample>,
    max_error: Length,
    achieved_error: Length,
    forced_intervals: usize,
}

#[derive(Deserialize)]
struct ParameterizationData {
    samples: Vec<ArcLengthSample>,
    max_error: Length,
    achieved_error: Length,
    forced_intervals: usize,
}

impl TryFrom<ParameterizationData> for ArcLengthParameterization {
    type Error = CurveError;

    fn try_from(data: ParameterizationData) -> Result<Self> {
        validate_samples(&data.samples)?;
        if !(data.max_error.value() > 0.0 && data.max_error.is_finite()) {
            return Err(CurveError::InvalidTolerance(data.max_error.value()));
        }
        if !(data.achieved_error.value() >= 0.0) {
            return Err(CurveError::invalid_table("achieved error must be non-negative"));
        }
        Ok(Self {
            samples: data.samples,
            max_error: data.max_error,
            achieved_error: data.achieved_error,
            forced_intervals: data.forced_intervals,
        })
    }
}

/// Rows must run from `(0, 0)` to parameter `1`, non-decreasing in both columns.
fn validate_samples(samples: &[ArcLengthSample]) -> Result<()> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err(CurveError::invalid_table("no samples"));
    };
    if first.parameter != 0.0 || first.length != Length::zero() {
        return Err(CurveError::invalid_table("first sample is not (0, 0)"));
    }
    if last.parameter != 1.0 {
        return Err(CurveError::invalid_table("last sample does not end at parameter 1"));
    }
    for pair in samples.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if !(a.parameter <= b.parameter && a.length <= b.length && b.length.is_finite()) {
            return Err(CurveError::invalid_table("samples are not monotonic"));
        }
    }
    Ok(())
}

struct Pending {
    domain: Interval,
    depth: u32,
}

impl ArcLengthParameterization {
    /// Integrate the arc length of `curve` to within `config.max_error`.
    ///
    /// Intervals still too coarse at `config.max_depth` are accepted anyway;
    /// see [`achieved_error`](Self::achieved_error) and
    /// [`check_tolerance`](Self::check_tolerance).
    #[instrument(skip_all, fields(max_error = config.max_error.in_meters()))]
    pub fn build<C, const D: usize>(
        curve: &Nondegenerate<C, D>,
        config: &ParameterizationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let max_error = config.max_error.in_meters();
        let max_depth = config.max_depth;

        let seed_depth = seed_depth(curve, max_error, max_depth);
        let seed_count = 1usize << seed_depth;
        let mut stack: Vec<Pending> = (0..seed_count)
            .rev()
            .map(|i| Pending {
                domain: Interval::new(
                    i as f64 / seed_count as f64,
                    (i + 1) as f64 / seed_count as f64,
                ),
                depth: seed_depth,
            })
            .collect();

        let mut samples = vec![ArcLengthSample {
            parameter: 0.0,
            length: Length::zero(),
        }];
        let mut cumulative = 0.0;
        let mut consumed = 0.0;
        let mut achieved = 0.0;
        let mut forced = 0usize;
        let mut accepted = 0usize;

        while let Some(Pending { domain, depth }) = stack.pop() {
            let (lower, upper) = length_bounds(curve, &domain);
            let range = upper - lower;
            let end = domain.max();
            let budget = max_error * end - consumed;

            let within_budget = !(range > budget);
            if !within_budget && depth < max_depth {
                let (left, right) = domain.bisect();
                stack.push(Pending {
                    domain: right,
                    depth: depth + 1,
                });
                stack.push(Pending {
                    domain: left,
                    depth: depth + 1,
                });
                continue;
            }
            if !within_budget {
                forced += 1;
            }
            accepted += 1;
            achieved += range;
            consumed = (consumed + range).min(max_error * end);

            let estimate = gauss_length(curve, &domain).max(lower).min(upper);
            if estimate > 0.0 {
                cumulative += estimate;
                samples.push(ArcLengthSample {
                    parameter: end,
                    length: Length::meters(cumulative),
                });
            } else if let [_, .., last] = samples.as_mut_slice() {
                last.parameter = end;
            }
        }

        match samples.as_mut_slice() {
            [_, .., last] => last.parameter = 1.0,
            _ => samples.push(ArcLengthSample {
                parameter: 1.0,
                length: Length::zero(),
            }),
        }

        if forced > 0 {
            warn!(
                forced_intervals = forced,
                achieved_error = achieved,
                max_depth,
                "depth cap reached before arc length tolerance"
            );
        }
        debug!(
            intervals = accepted,
            seed_depth,
            total_length = cumulative,
            achieved_error = achieved,
            "built arc length parameterization"
        );

        Ok(Self {
            samples,
            max_error: config.max_error,
            achieved_error: Length::meters(achieved),
            forced_intervals: forced,
        })
    }

    pub fn samples(&self) -> &[ArcLengthSample] {
        &self.samples
    }

    pub fn total_length(&self) -> Length {
        self.samples
            .last()
            .map(|sample| sample.length)
            .unwrap_or_else(Length::zero)
    }

    /// Requested error bound.
    pub fn max_error(&self) -> Length {
        self.max_error
    }

    /// Sum of the bound widths of all accepted intervals; an upper bound on
    /// the error of the total length.
    pub fn achieved_error(&self) -> Length {
        self.achieved_error
    }

    /// Number of intervals accepted only because of the depth cap.
    pub fn forced_intervals(&self) -> usize {
        self.forced_intervals
    }

    pub fn within_tolerance(&self) -> bool {
        self.achieved_error <= self.max_error
    }

    /// Fails with [`CurveError::ToleranceUnreachable`] if the depth cap kept
    /// the table from reaching `max_error`.
    pub fn check_tolerance(&self) -> Result<()> {
        if self.within_tolerance() {
            Ok(())
        } else {
            Err(CurveError::ToleranceUnreachable {
                requested: self.max_error.in_meters(),
                achieved: self.achieved_error.in_meters(),
            })
        }
    }

    /// Curve parameter at cumulative length `length`.
    ///
    /// Lengths at or below zero (and NaN) give exactly `0`; lengths at or
    /// above the total give exactly `1`. Monotonic in between.
    pub fn arc_length_to_parameter_value(&self, length: Length) -> f64 {
        let s = length.in_meters();
        let total = self.total_length().in_meters();
        if !(s > 0.0) {
            return 0.0;
        }
        if s >= total {
            return 1.0;
        }
        let index = self.samples.partition_point(|sample| sample.length.in_meters() < s);
        let (Some(before), Some(after)) = (
            index.checked_sub(1).and_then(|i| self.samples.get(i)),
            self.samples.get(index),
        ) else {
            return 1.0;
        };
        let (s0, s1) = (before.length.in_meters(), after.length.in_meters());
        if !(s1 > s0) || s >= s1 {
            return after.parameter;
        }
        let fraction = (s - s0) / (s1 - s0);
        (before.parameter + fraction * (after.parameter - before.parameter)).min(after.parameter)
    }

    /// Cumulative length at curve parameter `t`, clamped to `[0, total]`.
    pub fn parameter_value_to_arc_length(&self, t: f64) -> Length {
        if !(t > 0.0) {
            return Length::zero();
        }
        if t >= 1.0 {
            return self.total_length();
        }
        let index = self.samples.partition_point(|sample| sample.parameter < t);
        let (Some(before), Some(after)) = (
            index.checked_sub(1).and_then(|i| self.samples.get(i)),
            self.samples.get(index),
        ) else {
            return self.total_length();
        };
        let fraction = if after.parameter > before.parameter {
            (t - before.parameter) / (after.parameter - before.parameter)
        } else {
            1.0
        };
        Length::interpolate_from(before.length, after.length, fraction)
    }

    /// The table of the reversed curve, whose parameter `t` is `1 - t` here.
    pub fn reversed(&self) -> Self {
        let total = self.total_length();
        let samples = self
            .samples
            .iter()
            .rev()
            .map(|sample| ArcLengthSample {
                parameter: 1.0 - sample.parameter,
                length: total - sample.length,
            })
            .collect();
        Self {
            samples,
            max_error: self.max_error,
            achieved_error: self.achieved_error,
            forced_intervals: self.forced_intervals,
        }
    }
}

/// Uniform subdivision depth matching the polyline approximation count.
fn seed_depth<C, const D: usize>(curve: &Nondegenerate<C, D>, max_error: f64, max_depth: u32) -> u32 {
    let m2 = curve
        .second_derivative_bounding_box(Interval::unit())
        .max_magnitude()
        .in_meters();
    let count = (m2 / (8.0 * max_error)).sqrt();
    let depth = count.log2().ceil();
    let cap = max_depth.min(MAX_SEED_DEPTH);
    if depth.is_finite() && depth > 0.0 {
        (depth as u32).min(cap)
    } else if depth == f64::INFINITY {
        cap
    } else {
        0
    }
}

/// Lower and upper bounds on the arc length over `domain`.
fn length_bounds<C, const D: usize>(curve: &Nondegenerate<C, D>, domain: &Interval) -> (f64, f64) {
    let width = domain.width();
    let speed = curve.first_derivative_bounding_box(*domain);
    let chord = curve
        .point_on(domain.min())
        .distance_to(&curve.point_on(domain.max()))
        .in_meters();
    let lower = (speed.min_magnitude().in_meters() * width).max(chord);
    let mut upper = speed.max_magnitude().in_meters() * width;
    if let Some(bound) = curve.length_upper_bound(*domain) {
        upper = upper.min(bound.in_meters());
    }
    if lower > upper {
        (upper, lower)
    } else {
        (lower, upper)
    }
}
