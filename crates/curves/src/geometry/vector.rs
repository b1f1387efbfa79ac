use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};

use approx::AbsDiffEq;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use super::quantity::{Angle, Length};
use crate::error::{CurveError, Result};

/// A displacement (or derivative) vector in coordinate system `C`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Vector<C, const D: usize> {
    components: SVector<f64, D>,
    #[serde(skip)]
    space: PhantomData<C>,
}

pub type Vector2d<C> = Vector<C, 2>;
pub type Vector3d<C> = Vector<C, 3>;

impl<C, const D: usize> Vector<C, D> {
    pub fn from_components(components: SVector<f64, D>) -> Self {
        Self {
            components,
            space: PhantomData,
        }
    }

    pub fn zero() -> Self {
        Self::from_components(SVector::zeros())
    }

    pub fn components(&self) -> SVector<f64, D> {
        self.components
    }

    pub fn component(&self, i: usize) -> f64 {
        self.components[i]
    }

    pub fn magnitude(&self) -> Length {
        Length::meters(self.components.norm())
    }

    pub fn squared_magnitude(&self) -> f64 {
        self.components.norm_squared()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.components.dot(&other.components)
    }

    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|&c| c == 0.0)
    }

    /// The direction of this vector, or `None` for the zero vector.
    pub fn direction(&self) -> Option<Direction<C, D>> {
        let length = self.components.norm();
        if length == 0.0 || !length.is_finite() {
            None
        } else {
            Some(Direction::unchecked(self.components / length))
        }
    }

    pub fn project_onto(&self, direction: &Direction<C, D>) -> Self {
        *direction * self.dot(&direction.to_vector())
    }
}

impl<C> Vector<C, 2> {
    pub fn new(x: f64, y: f64) -> Self {
        Self::from_components(SVector::<f64, 2>::new(x, y))
    }

    /// Counterclockwise perpendicular of the same magnitude.
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.components[1], self.components[0])
    }

    /// z component of the 2D cross product.
    pub fn cross(&self, other: &Self) -> f64 {
        self.components[0] * other.components[1] - self.components[1] * other.components[0]
    }
}

impl<C> Vector<C, 3> {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_components(SVector::<f64, 3>::new(x, y, z))
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::from_components(self.components.cross(&other.components))
    }
}

impl<C, const D: usize> Clone for Vector<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for Vector<C, D> {}

impl<C, const D: usize> PartialEq for Vector<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl<C, const D: usize> fmt::Debug for Vector<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector{:?}", self.components.as_slice())
    }
}

impl<C, const D: usize> Add for Vector<C, D> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_components(self.components + rhs.components)
    }
}

impl<C, const D: usize> Sub for Vector<C, D> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_components(self.components - rhs.components)
    }
}

impl<C, const D: usize> Neg for Vector<C, D> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::from_components(-self.components)
    }
}

impl<C, const D: usize> Mul<f64> for Vector<C, D> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::from_components(self.components * rhs)
    }
}

impl<C, const D: usize> Mul<Vector<C, D>> for f64 {
    type Output = Vector<C, D>;
    fn mul(self, rhs: Vector<C, D>) -> Self::Output {
        Vector::from_components(rhs.components * self)
    }
}

impl<C, const D: usize> Div<f64> for Vector<C, D> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::from_components(self.components / rhs)
    }
}

impl<C, const D: usize> AbsDiffEq for Vector<C, D> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.components.abs_diff_eq(&other.components, epsilon)
    }
}

/// A unit vector.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "DirectionData<D>")]
pub struct Direction<C, const D: usize> {
    components: SVector<f64, D>,
    #[serde(skip)]
    space: PhantomData<C>,
}

/// Serialized components, renormalized on load.
#[derive(Deserialize)]
struct DirectionData<const D: usize> {
    components: SVector<f64, D>,
}

impl<C, const D: usize> TryFrom<DirectionData<D>> for Direction<C, D> {
    type Error = CurveError;

    fn try_from(data: DirectionData<D>) -> Result<Self> {
        Vector::from_components(data.components)
            .direction()
            .ok_or_else(|| CurveError::invalid_frame("direction has zero length"))
    }
}

pub type Direction2d<C> = Direction<C, 2>;
pub type Direction3d<C> = Direction<C, 3>;

impl<C, const D: usize> Direction<C, D> {
    /// Caller guarantees `components` has unit length.
    pub(crate) fn unchecked(components: SVector<f64, D>) -> Self {
        Self {
            components,
            space: PhantomData,
        }
    }

    /// Unit vector along coordinate axis `i`.
    pub fn axis(i: usize) -> Self {
        Self::unchecked(SVector::from_fn(|row, _| if row == i { 1.0 } else { 0.0 }))
    }

    pub fn to_vector(&self) -> Vector<C, D> {
        Vector::from_components(self.components)
    }

    pub fn components(&self) -> SVector<f64, D> {
        self.components
    }

    pub fn component(&self, i: usize) -> f64 {
        self.components[i]
    }

    pub fn reverse(&self) -> Self {
        Self::unchecked(-self.components)
    }

    pub fn angle_to(&self, other: &Self) -> Angle {
        let cos = self.components.dot(&other.components).clamp(-1.0, 1.0);
        Angle::radians(cos.acos())
    }
}

impl<C> Direction<C, 2> {
    pub fn x() -> Self {
        Self::axis(0)
    }

    pub fn y() -> Self {
        Self::axis(1)
    }

    pub fn from_angle(angle: Angle) -> Self {
        Self::unchecked(SVector::<f64, 2>::new(angle.cos(), angle.sin()))
    }

    /// Rotated a quarter turn counterclockwise.
    pub fn perpendicular(&self) -> Self {
        Self::unchecked(SVector::<f64, 2>::new(-self.components[1], self.components[0]))
    }
}

impl<C> Direction<C, 3> {
    pub fn x() -> Self {
        Self::axis(0)
    }

    pub fn y() -> Self {
        Self::axis(1)
    }

    pub fn z() -> Self {
        Self::axis(2)
    }

    /// Normalized cross product, `None` if the directions are parallel.
    pub fn cross(&self, other: &Self) -> Option<Self> {
        Vector::<C, 3>::from_components(self.components.cross(&other.components)).direction()
    }
}

impl<C, const D: usize> Clone for Direction<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for Direction<C, D> {}

impl<C, const D: usize> PartialEq for Direction<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl<C, const D: usize> fmt::Debug for Direction<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Direction{:?}", self.components.as_slice())
    }
}

impl<C, const D: usize> Mul<f64> for Direction<C, D> {
    type Output = Vector<C, D>;
    fn mul(self, rhs: f64) -> Self::Output {
        Vector::from_components(self.components * rhs)
    }
}

impl<C, const D: usize> Mul<Length> for Direction<C, D> {
    type Output = Vector<C, D>;
    fn mul(self, rhs: Length) -> Self::Output {
        self * rhs.in_meters()
    }
}

impl<C, const D: usize> AbsDiffEq for Direction<C, D> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.components.abs_diff_eq(&other.components, epsilon)
    }
}
