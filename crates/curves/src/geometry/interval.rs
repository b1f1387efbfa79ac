use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::quantity::interpolate_scalar;

/// A closed interval `[min, max]` of real numbers.
///
/// Used for parameter sub-ranges and, through interval arithmetic, for
/// conservative bounds on derivative components over such a sub-range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "IntervalData")]
pub struct Interval {
    min: f64,
    max: f64,
}

/// Serialized endpoints, reordered by [`Interval::new`] on load.
#[derive(Deserialize)]
struct IntervalData {
    min: f64,
    max: f64,
}

impl From<IntervalData> for Interval {
    fn from(data: IntervalData) -> Self {
        Self::new(data.min, data.max)
    }
}

impl Interval {
    /// Create an interval from two endpoints given in either order.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn singleton(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// The parameter domain `[0, 1]` of every curve.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        self.interpolate(0.5)
    }

    /// Value at fraction `t` across the interval; exact at both ends.
    pub fn interpolate(&self, t: f64) -> f64 {
        interpolate_scalar(self.min, self.max, t)
    }

    pub fn bisect(&self) -> (Self, Self) {
        let mid = self.midpoint();
        (Self::new(self.min, mid), Self::new(mid, self.max))
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn contains_interval(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn hull(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Smallest interval containing every value yielded.
    pub fn hull_of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .map(Self::singleton)
            .reduce(|acc, v| acc.hull(&v))
    }

    /// Smallest absolute value of any member.
    pub fn distance_from_zero(&self) -> f64 {
        if self.min > 0.0 {
            self.min
        } else if self.max < 0.0 {
            -self.max
        } else {
            0.0
        }
    }

    /// Largest absolute value of any member.
    pub fn max_abs(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }

    pub fn squared(&self) -> Self {
        let lo = self.distance_from_zero();
        let hi = self.max_abs();
        Self {
            min: lo * lo,
            max: hi * hi,
        }
    }

    /// Divide by an interval known to be strictly positive (e.g. a rational
    /// curve's weight function with positive weights).
    pub fn div_positive(&self, denominator: &Self) -> Self {
        *self * Self::new(1.0 / denominator.max, 1.0 / denominator.min)
    }

    /// Exact enclosure of `sin(x)` for `x` in this interval.
    pub fn sin(&self) -> Self {
        if self.width() >= TAU {
            return Self::new(-1.0, 1.0);
        }
        let mut result = Self::new(self.min.sin(), self.max.sin());
        if self.contains_angle(FRAC_PI_2) {
            result.max = 1.0;
        }
        if self.contains_angle(-FRAC_PI_2) {
            result.min = -1.0;
        }
        result
    }

    /// Exact enclosure of `cos(x)` for `x` in this interval.
    pub fn cos(&self) -> Self {
        if self.width() >= TAU {
            return Self::new(-1.0, 1.0);
        }
        let mut result = Self::new(self.min.cos(), self.max.cos());
        if self.contains_angle(0.0) {
            result.max = 1.0;
        }
        if self.contains_angle(PI) {
            result.min = -1.0;
        }
        result
    }

    /// Does the interval contain `angle + 2πk` for some integer `k`?
    fn contains_angle(&self, angle: f64) -> bool {
        let k = ((self.min - angle) / TAU).ceil();
        angle + k * TAU <= self.max
    }
}

impl Add for Interval {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}

impl Add<f64> for Interval {
    type Output = Self;
    fn add(self, rhs: f64) -> Self::Output {
        Self {
            min: self.min + rhs,
            max: self.max + rhs,
        }
    }
}

impl Sub for Interval {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            min: self.min - rhs.max,
            max: self.max - rhs.min,
        }
    }
}

impl Neg for Interval {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            min: -self.max,
            max: -self.min,
        }
    }
}

impl Mul for Interval {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        let products = [
            self.min * rhs.min,
            self.min * rhs.max,
            self.max * rhs.min,
            self.max * rhs.max,
        ];
        Self {
            min: products.iter().copied().fold(f64::INFINITY, f64::min),
            max: products.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl Mul<f64> for Interval {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.min * rhs, self.max * rhs)
    }
}

impl Mul<Interval> for f64 {
    type Output = Interval;
    fn mul(self, rhs: Interval) -> Self::Output {
        rhs * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_endpoints() {
        let i = Interval::new(3.0, -1.0);
        assert_eq!(i.min(), -1.0);
        assert_eq!(i.max(), 3.0);
        assert_eq!(i.width(), 4.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Interval::new(1.0, 2.0);
        let b = Interval::new(-3.0, 4.0);
        assert_eq!(a + b, Interval::new(-2.0, 6.0));
        assert_eq!(a - b, Interval::new(-3.0, 5.0));
        assert_eq!(a * b, Interval::new(-6.0, 8.0));
        assert_eq!(a * -2.0, Interval::new(-4.0, -2.0));
        assert_eq!(-a, Interval::new(-2.0, -1.0));
    }

    #[test]
    fn test_squared_straddling_zero() {
        assert_eq!(Interval::new(-2.0, 1.0).squared(), Interval::new(0.0, 4.0));
        assert_eq!(Interval::new(2.0, 3.0).squared(), Interval::new(4.0, 9.0));
    }

    #[test]
    fn test_div_positive() {
        let q = Interval::new(2.0, 4.0).div_positive(&Interval::new(1.0, 2.0));
        assert_eq!(q, Interval::new(1.0, 4.0));
    }

    #[test]
    fn test_sin_cos_enclosures() {
        let i = Interval::new(0.0, PI);
        let s = i.sin();
        assert_eq!(s.max(), 1.0);
        assert!(s.min().abs() < 1e-15);
        assert_eq!(i.cos(), Interval::new(-1.0, 1.0));

        let narrow = Interval::new(0.1, 0.2);
        assert_eq!(narrow.sin(), Interval::new(0.1f64.sin(), 0.2f64.sin()));
        assert_eq!(narrow.cos(), Interval::new(0.2f64.cos(), 0.1f64.cos()));

        // Extremum reached through a multiple of 2π.
        let shifted = Interval::new(2.0 * TAU - 0.1, 2.0 * TAU + 0.1);
        assert_eq!(shifted.cos().max(), 1.0);
        assert_eq!(Interval::new(-10.0, 10.0).sin(), Interval::new(-1.0, 1.0));
    }

    #[test]
    fn test_sin_contains_samples() {
        let i = Interval::new(-2.3, 1.9);
        let s = i.sin();
        let c = i.cos();
        for k in 0..=100 {
            let x = i.interpolate(k as f64 / 100.0);
            assert!(s.contains(x.sin()));
            assert!(c.contains(x.cos()));
        }
    }

    #[test]
    fn test_hull_and_contains() {
        let h = Interval::hull_of([0.5, -1.0, 2.0]).unwrap();
        assert_eq!(h, Interval::new(-1.0, 2.0));
        assert!(h.contains(0.0));
        assert!(!h.contains(2.5));
        assert!(Interval::hull_of(std::iter::empty()).is_none());
        assert!(h.contains_interval(&Interval::new(0.0, 1.0)));
    }

    #[test]
    fn test_interpolate_and_bisect() {
        let i = Interval::new(0.3, 0.7);
        assert_eq!(i.interpolate(0.0), 0.3);
        assert_eq!(i.interpolate(1.0), 0.7);
        let (left, right) = i.bisect();
        assert_eq!(left.max(), right.min());
        assert_eq!(left.min(), 0.3);
        assert_eq!(right.max(), 0.7);
    }

    #[test]
    fn test_distance_from_zero() {
        assert_eq!(Interval::new(-1.0, 1.0).distance_from_zero(), 0.0);
        assert_eq!(Interval::new(0.5, 1.0).distance_from_zero(), 0.5);
        assert_eq!(Interval::new(-3.0, -2.0).distance_from_zero(), 2.0);
        assert_eq!(Interval::new(-3.0, -2.0).max_abs(), 3.0);
    }

    #[test]
    fn test_deserialize_orders_endpoints() {
        let i: Interval = serde_json::from_str(r#"{"min": 2.0, "max": -1.0}"#).unwrap();
        assert_eq!(i, Interval::new(-1.0, 2.0));
        let json = serde_json::to_string(&Interval::new(0.25, 0.5)).unwrap();
        assert_eq!(serde_json::from_str::<Interval>(&json).unwrap(), Interval::new(0.25, 0.5));
    }
}
