use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Sub};

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::point::Point;
use super::quantity::Length;
use super::vector::Vector;

/// A box of vectors: one [`Interval`] per component.
///
/// Derivative bounding boxes are `VectorBox`es; the integrator reads speed
/// bounds off [`VectorBox::min_magnitude`] and [`VectorBox::max_magnitude`].
pub struct VectorBox<C, const D: usize> {
    components: [Interval; D],
    space: PhantomData<C>,
}

impl<C, const D: usize> VectorBox<C, D> {
    pub fn new(components: [Interval; D]) -> Self {
        Self {
            components,
            space: PhantomData,
        }
    }

    /// The box containing only the zero vector.
    pub fn zero() -> Self {
        Self::singleton(&Vector::zero())
    }

    pub fn singleton(vector: &Vector<C, D>) -> Self {
        Self::new(std::array::from_fn(|i| Interval::singleton(vector.component(i))))
    }

    /// Smallest box containing every vector yielded, or `None` if empty.
    pub fn hull_of<I>(vectors: I) -> Option<Self>
    where
        I: IntoIterator<Item = SVector<f64, D>>,
    {
        vectors
            .into_iter()
            .map(|v| Self::singleton(&Vector::from_components(v)))
            .reduce(|acc, b| acc.hull(&b))
    }

    pub fn component(&self, i: usize) -> Interval {
        self.components[i]
    }

    pub fn components(&self) -> &[Interval; D] {
        &self.components
    }

    pub fn hull(&self, other: &Self) -> Self {
        Self::new(std::array::from_fn(|i| {
            self.components[i].hull(&other.components[i])
        }))
    }

    pub fn contains(&self, vector: &Vector<C, D>) -> bool {
        (0..D).all(|i| self.components[i].contains(vector.component(i)))
    }

    /// Lower bound on the magnitude of any vector in the box.
    pub fn min_magnitude(&self) -> Length {
        let sum: f64 = self
            .components
            .iter()
            .map(|c| c.distance_from_zero().powi(2))
            .sum();
        Length::meters(sum.sqrt())
    }

    /// Upper bound on the magnitude of any vector in the box.
    pub fn max_magnitude(&self) -> Length {
        let sum: f64 = self.components.iter().map(|c| c.max_abs().powi(2)).sum();
        Length::meters(sum.sqrt())
    }

    /// Divide every component by a strictly positive interval.
    pub fn div_positive(&self, denominator: &Interval) -> Self {
        Self::new(std::array::from_fn(|i| {
            self.components[i].div_positive(denominator)
        }))
    }

    pub fn is_zero(&self) -> bool {
        self.components
            .iter()
            .all(|c| c.min() == 0.0 && c.max() == 0.0)
    }
}

impl<C, const D: usize> Clone for VectorBox<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for VectorBox<C, D> {}

impl<C, const D: usize> PartialEq for VectorBox<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl<C, const D: usize> fmt::Debug for VectorBox<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VectorBox").field(&self.components).finish()
    }
}

impl<C, const D: usize> Add for VectorBox<C, D> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(std::array::from_fn(|i| self.components[i] + rhs.components[i]))
    }
}

impl<C, const D: usize> Sub for VectorBox<C, D> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(std::array::from_fn(|i| self.components[i] - rhs.components[i]))
    }
}

/// Scale every component by a scalar interval.
impl<C, const D: usize> Mul<Interval> for VectorBox<C, D> {
    type Output = Self;
    fn mul(self, rhs: Interval) -> Self::Output {
        Self::new(std::array::from_fn(|i| self.components[i] * rhs))
    }
}

impl<C, const D: usize> Mul<f64> for VectorBox<C, D> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(std::array::from_fn(|i| self.components[i] * rhs))
    }
}

/// Axis-aligned bounding box of points.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BoundingBox<C, const D: usize> {
    pub min: Point<C, D>,
    pub max: Point<C, D>,
}

impl<C, const D: usize> BoundingBox<C, D> {
    /// Create a box from two opposite corners given in any order.
    pub fn new(a: Point<C, D>, b: Point<C, D>) -> Self {
        let (a, b) = (a.coords(), b.coords());
        Self {
            min: Point::from_coords(SVector::from_fn(|i, _| a[i].min(b[i]))),
            max: Point::from_coords(SVector::from_fn(|i, _| a[i].max(b[i]))),
        }
    }

    pub fn singleton(point: Point<C, D>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn empty() -> Self {
        Self {
            min: Point::from_coords(SVector::repeat(f64::INFINITY)),
            max: Point::from_coords(SVector::repeat(f64::NEG_INFINITY)),
        }
    }

    pub fn from_points(points: &[Point<C, D>]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    /// Box spanned by a fixed point offset by every vector in `offsets`.
    pub fn from_offsets(base: &Point<C, D>, offsets: &VectorBox<C, D>) -> Self {
        let c = base.coords();
        Self {
            min: Point::from_coords(SVector::from_fn(|i, _| c[i] + offsets.component(i).min())),
            max: Point::from_coords(SVector::from_fn(|i, _| c[i] + offsets.component(i).max())),
        }
    }

    pub fn expand_to_include(&mut self, p: &Point<C, D>) {
        let (lo, hi) = (*self.min.coords(), *self.max.coords());
        let c = p.coords();
        self.min = Point::from_coords(SVector::from_fn(|i, _| lo[i].min(c[i])));
        self.max = Point::from_coords(SVector::from_fn(|i, _| hi[i].max(c[i])));
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut bb = *self;
        bb.expand_to_include(&other.min);
        bb.expand_to_include(&other.max);
        bb
    }

    pub fn contains(&self, p: &Point<C, D>) -> bool {
        (0..D).all(|i| self.min.coords()[i] <= p.coords()[i] && p.coords()[i] <= self.max.coords()[i])
    }

    /// Extent along coordinate axis `i`.
    pub fn interval(&self, i: usize) -> Interval {
        Interval::new(self.min.coords()[i], self.max.coords()[i])
    }

    pub fn diagonal(&self) -> Length {
        self.min.distance_to(&self.max)
    }

    pub fn center(&self) -> Point<C, D> {
        self.min.midpoint(&self.max)
    }
}

impl<C, const D: usize> Clone for BoundingBox<C, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, const D: usize> Copy for BoundingBox<C, D> {}

impl<C, const D: usize> PartialEq for BoundingBox<C, D> {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

impl<C, const D: usize> fmt::Debug for BoundingBox<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundingBox")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}
