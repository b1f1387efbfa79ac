use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Sub};

use approx::AbsDiffEq;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use super::quantity::{interpolate_scalar, Length};
use super::vector::Vector;

/// A point in `D`-dimensional Euclidean space, tagged with the coordinate
/// system `C` it is expressed in.
///
/// Coordinates are in meters. Points in different coordinate systems cannot
/// be mixed without an explicit conversion through a [`super::Frame`] or
/// [`super::SketchPlane`].
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<C, const D: usize> {
    coords: SVector<f64, D>,
    #[serde(skip)]
    space: PhantomData<C>,
}

/// A point in 2D space.
pub type Point2d<C> = Point<C, 2>;

/// A point in 3D space.
pub type Point3d<C> = Point<C, 3>;

impl<C, const D: usize> Point<C, D> {
    pub fn from_coords(coords: SVector<f64, D>) -> Self {
        Self {
            coords,
            space: PhantomData,
        }
    }

    pub fn origin() -> Self {
        Self::from_coords(SVector::zeros())
    }

    pub fn coords(&self) -> &SVector<f64, D> {
        &self.coords
    }

    /// Coordinate along axis `i`.
    pub fn coordinate(&self, i: usize) -> Length {
        Length::meters(self.coords[i])
    }

    pub fn distance_to(&self, other: &Self) -> Length {
        Length::meters((self.coords - other.coords).norm())
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self::interpolate(self, other, 0.5)
    }

    /// Interpolate between two points.
    ///
    /// Returns exactly `start` at `t = 0` and exactly `end` at `t = 1`, which
    /// every de Casteljau evaluation relies on for endpoint exactness.
    pub fn interpolate(start: &Self, end: &Self, t: f64) -> Self {
        Self::from_coords(SVector::from_fn(|i, _| {
            interpolate_scalar(start.coords[i], end.coords[i], t)
        }))
    }

    pub fn translate_by(&self, displacement: &Vector<C, D>) -> Self {
        *self + *displacement
    }
}

impl<C> Point<C, 2> {
    pub fn new(x: f64, y: f64) -> Self {
        Self::from_coords(SVector::<f64, 2>::new(x, y))
    }

    pub fn xy(x: Length, y: Length) -> Self {
        Self::new(x.in_meters(), y.in_meters())
    }

    pub fn x(&self) -> Length {
        self.coordinate(0)
    }

    pub fn y(&self) -> Length {
        self.coordinate(1)
    }
}

impl<C> Point<C, 3> {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_coords(SVector::<f64, 3>::new(x, y, z))
    }

    pub fn xyz(x: Length, y: Length, z: Length) -> Self {
        Self::new(x.in_meters(), y.in_meters(), z.in_meters())
    }

    pub fn x(&self) -> Length {
        self.coordinate(0)
    }

    pub fn y(&self) -> Length {
        self.coordinate(1)
    }

    pub fn z(&self) -> Length {
        self.coordinate(2)
    }
}

impl<C, const D: usize> Clone for Point<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for Point<C, D> {}

impl<C, const D: usize> PartialEq for Point<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}

impl<C, const D: usize> fmt::Debug for Point<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point{:?}", self.coords.as_slice())
    }
}

impl<C, const D: usize> Add<Vector<C, D>> for Point<C, D> {
    type Output = Point<C, D>;
    fn add(self, rhs: Vector<C, D>) -> Self::Output {
        Point::from_coords(self.coords + rhs.components())
    }
}

impl<C, const D: usize> Sub<Vector<C, D>> for Point<C, D> {
    type Output = Point<C, D>;
    fn sub(self, rhs: Vector<C, D>) -> Self::Output {
        Point::from_coords(self.coords - rhs.components())
    }
}

impl<C, const D: usize> Sub for Point<C, D> {
    type Output = Vector<C, D>;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector::from_components(self.coords - rhs.coords)
    }
}

impl<C, const D: usize> AbsDiffEq for Point<C, D> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.coords.abs_diff_eq(&other.coords, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    enum World {}

    #[test]
    fn test_point_distance() {
        let a = Point3d::<World>::new(1.0, 0.0, 0.0);
        let b = Point3d::<World>::new(4.0, 0.0, 0.0);
        assert_eq!(a.distance_to(&b), Length::meters(3.0));
    }

    #[test]
    fn test_point_midpoint() {
        let a = Point3d::<World>::origin();
        let b = Point3d::<World>::new(2.0, 4.0, 6.0);
        assert_eq!(a.midpoint(&b), Point3d::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_point_sub_gives_vector() {
        let a = Point2d::<World>::new(3.0, 4.0);
        let b = Point2d::<World>::new(1.0, 1.0);
        let v = a - b;
        assert_eq!(v, Vector::<World, 2>::new(2.0, 3.0));
        assert_eq!(b + v, a);
    }

    #[test]
    fn test_interpolate_endpoints_are_exact() {
        let a = Point2d::<World>::new(0.1, 0.7);
        let b = Point2d::<World>::new(0.3, -1.9);
        assert_eq!(Point2d::interpolate(&a, &b, 0.0), a);
        assert_eq!(Point2d::interpolate(&a, &b, 1.0), b);
        assert_abs_diff_eq!(
            Point2d::interpolate(&a, &b, 0.25),
            Point2d::new(0.15, 0.05),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_accessors() {
        let p = Point3d::<World>::xyz(Length::meters(1.0), Length::meters(2.0), Length::meters(3.0));
        assert_eq!(p.x(), Length::meters(1.0));
        assert_eq!(p.y(), Length::meters(2.0));
        assert_eq!(p.z(), Length::meters(3.0));
    }
}
