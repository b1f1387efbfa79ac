use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker trait for units of measure.
pub trait Unit {
    /// Suffix used when formatting values.
    const SYMBOL: &'static str;
}

/// Lengths, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meters {}

/// Angles, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radians {}

impl Unit for Meters {
    const SYMBOL: &'static str = "m";
}

impl Unit for Radians {
    const SYMBOL: &'static str = "rad";
}

/// A scalar tagged with a unit of measure.
///
/// Only quantities of the same unit can be added, subtracted or compared.
/// Comparison operators are exact; use [`Quantity::approx_eq`] or the
/// `approx` traits when a tolerance is intended.
pub struct Quantity<U> {
    value: f64,
    unit: PhantomData<U>,
}

/// A length in meters.
pub type Length = Quantity<Meters>;

/// An angle in radians.
pub type Angle = Quantity<Radians>;

impl<U> Quantity<U> {
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            unit: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0)
    }

    pub const fn value(self) -> f64 {
        self.value
    }

    pub fn abs(self) -> Self {
        Self::new(self.value.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.value.min(other.value))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.value.max(other.value))
    }

    /// Clamp into `[lower, upper]`. The bounds may be given in either order.
    pub fn clamp(self, lower: Self, upper: Self) -> Self {
        let (lo, hi) = if lower.value <= upper.value {
            (lower.value, upper.value)
        } else {
            (upper.value, lower.value)
        };
        Self::new(self.value.max(lo).min(hi))
    }

    pub fn is_finite(self) -> bool {
        self.value.is_finite()
    }

    pub fn is_zero(self) -> bool {
        self.value == 0.0
    }

    /// Returns true if the two quantities differ by at most `tolerance`.
    pub fn approx_eq(self, other: Self, tolerance: Self) -> bool {
        (self.value - other.value).abs() <= tolerance.value
    }

    /// Interpolate between two quantities, returning exactly `start` at
    /// `t = 0` and exactly `end` at `t = 1`.
    pub fn interpolate_from(start: Self, end: Self, t: f64) -> Self {
        Self::new(interpolate_scalar(start.value, end.value, t))
    }

    /// Total ordering on the underlying value (NaN sorts last).
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl Length {
    pub const fn meters(value: f64) -> Self {
        Self::new(value)
    }

    pub const fn in_meters(self) -> f64 {
        self.value
    }
}

impl Angle {
    pub const fn radians(value: f64) -> Self {
        Self::new(value)
    }

    pub fn degrees(value: f64) -> Self {
        Self::new(value.to_radians())
    }

    pub fn half_turn() -> Self {
        Self::new(std::f64::consts::PI)
    }

    pub fn full_turn() -> Self {
        Self::new(std::f64::consts::TAU)
    }

    pub const fn in_radians(self) -> f64 {
        self.value
    }

    pub fn in_degrees(self) -> f64 {
        self.value.to_degrees()
    }

    pub fn sin(self) -> f64 {
        self.value.sin()
    }

    pub fn cos(self) -> f64 {
        self.value.cos()
    }
}

/// Linear interpolation that is exact at both `t = 0` and `t = 1`.
pub(crate) fn interpolate_scalar(a: f64, b: f64, t: f64) -> f64 {
    if t <= 0.5 {
        a + t * (b - a)
    } else {
        b + (1.0 - t) * (a - b)
    }
}

// ── Trait implementations ──────────────────────────────────────────────────
//
// Written by hand so that no bounds are placed on the unit marker.

impl<U> Clone for Quantity<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Quantity<U> {}

impl<U> Default for Quantity<U> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<U: Unit> fmt::Debug for Quantity<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.value, U::SYMBOL)
    }
}

impl<U: Unit> fmt::Display for Quantity<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, U::SYMBOL)
    }
}

impl<U> PartialEq for Quantity<U> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<U> PartialOrd for Quantity<U> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<U> Add for Quantity<U> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.value + rhs.value)
    }
}

impl<U> AddAssign for Quantity<U> {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
    }
}

impl<U> Sub for Quantity<U> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.value - rhs.value)
    }
}

impl<U> SubAssign for Quantity<U> {
    fn sub_assign(&mut self, rhs: Self) {
        self.value -= rhs.value;
    }
}

impl<U> Neg for Quantity<U> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.value)
    }
}

impl<U> Mul<f64> for Quantity<U> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.value * rhs)
    }
}

impl<U> Mul<Quantity<U>> for f64 {
    type Output = Quantity<U>;
    fn mul(self, rhs: Quantity<U>) -> Self::Output {
        Quantity::new(self * rhs.value)
    }
}

impl<U> Div<f64> for Quantity<U> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.value / rhs)
    }
}

/// Dividing two quantities of the same unit gives a plain ratio.
impl<U> Div for Quantity<U> {
    type Output = f64;
    fn div(self, rhs: Self) -> Self::Output {
        self.value / rhs.value
    }
}

impl<U> Sum for Quantity<U> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc + q)
    }
}

impl<U> AbsDiffEq for Quantity<U> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.value.abs_diff_eq(&other.value, epsilon)
    }
}

impl<U> RelativeEq for Quantity<U> {
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.value.relative_eq(&other.value, epsilon, max_relative)
    }
}

impl<U> Serialize for Quantity<U> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value)
    }
}

impl<'de, U> Deserialize<'de> for Quantity<U> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::new)
    }
}
