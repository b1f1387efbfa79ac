use std::fmt;
use std::marker::PhantomData;

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use super::point::{Point, Point2d, Point3d};
use super::vector::{Direction, Direction2d, Direction3d, Vector, Vector2d, Vector3d};
use crate::error::{CurveError, Result};

/// Axes must be orthonormal to within this tolerance.
const ORTHONORMAL_TOLERANCE: f64 = 1e-9;

/// A coordinate frame: an origin and orthonormal axes, all expressed in the
/// `Global` system, defining the `Local` system.
///
/// Converting geometry with [`Point::relative_to`] and [`Point::place_in`]
/// (and the matching methods on vectors, directions and curves) is the only
/// way to move between coordinate systems.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "FrameData<Global, D>")]
pub struct Frame<Global, Local, const D: usize> {
    origin: Point<Global, D>,
    /// Column `i` is the `i`-th local axis in global coordinates.
    basis: SMatrix<f64, D, D>,
    #[serde(skip)]
    local: PhantomData<Local>,
}

pub type Frame2d<G, L> = Frame<G, L, 2>;
pub type Frame3d<G, L> = Frame<G, L, 3>;

#[derive(Deserialize)]
#[serde(bound = "")]
struct FrameData<Global, const D: usize> {
    origin: Point<Global, D>,
    basis: SMatrix<f64, D, D>,
}

impl<G, L, const D: usize> TryFrom<FrameData<G, D>> for Frame<G, L, D> {
    type Error = CurveError;

    fn try_from(data: FrameData<G, D>) -> Result<Self> {
        Self::from_basis(data.origin, data.basis)
    }
}

impl<G, L, const D: usize> Frame<G, L, D> {
    /// Frame at `origin` with axes aligned to the global axes.
    pub fn at_point(origin: Point<G, D>) -> Self {
        Self {
            origin,
            basis: SMatrix::identity(),
            local: PhantomData,
        }
    }

    /// Build a frame from explicit axes, checking they are orthonormal.
    pub fn from_axes(origin: Point<G, D>, axes: [Direction<G, D>; D]) -> Result<Self> {
        let basis = SMatrix::<f64, D, D>::from_fn(|row, col| axes[col].component(row));
        Self::from_basis(origin, basis)
    }

    fn from_basis(origin: Point<G, D>, basis: SMatrix<f64, D, D>) -> Result<Self> {
        let gram = basis.transpose() * basis;
        if !gram.relative_eq(&SMatrix::identity(), ORTHONORMAL_TOLERANCE, ORTHONORMAL_TOLERANCE) {
            return Err(CurveError::invalid_frame("axes are not orthonormal"));
        }
        Ok(Self {
            origin,
            basis,
            local: PhantomData,
        })
    }

    pub fn origin(&self) -> Point<G, D> {
        self.origin
    }

    /// Local axis `i` expressed in global coordinates.
    pub fn axis(&self, i: usize) -> Direction<G, D> {
        Direction::unchecked(self.basis.column(i).into_owned())
    }

    pub(crate) fn to_local(&self, global: &SVector<f64, D>) -> SVector<f64, D> {
        self.basis.tr_mul(&(global - self.origin.coords()))
    }

    pub(crate) fn to_global(&self, local: &SVector<f64, D>) -> SVector<f64, D> {
        self.origin.coords() + self.basis * local
    }

    pub(crate) fn vector_to_local(&self, global: &SVector<f64, D>) -> SVector<f64, D> {
        self.basis.tr_mul(global)
    }

    pub(crate) fn vector_to_global(&self, local: &SVector<f64, D>) -> SVector<f64, D> {
        self.basis * local
    }
}

impl<G, L> Frame<G, L, 2> {
    /// Right-handed 2D frame with the given x direction.
    pub fn new(origin: Point2d<G>, x_direction: Direction2d<G>) -> Self {
        let y_direction = x_direction.perpendicular();
        Self {
            origin,
            basis: SMatrix::<f64, 2, 2>::from_columns(&[
                x_direction.components(),
                y_direction.components(),
            ]),
            local: PhantomData,
        }
    }

    pub fn x_direction(&self) -> Direction2d<G> {
        self.axis(0)
    }

    pub fn y_direction(&self) -> Direction2d<G> {
        self.axis(1)
    }
}

impl<G, L> Frame<G, L, 3> {
    /// Right-handed 3D frame from perpendicular x and y directions.
    pub fn new(
        origin: Point3d<G>,
        x_direction: Direction3d<G>,
        y_direction: Direction3d<G>,
    ) -> Result<Self> {
        let z_direction = x_direction
            .cross(&y_direction)
            .ok_or_else(|| CurveError::invalid_frame("x and y directions are parallel"))?;
        Self::from_axes(origin, [x_direction, y_direction, z_direction])
    }

    pub fn x_direction(&self) -> Direction3d<G> {
        self.axis(0)
    }

    pub fn y_direction(&self) -> Direction3d<G> {
        self.axis(1)
    }

    pub fn z_direction(&self) -> Direction3d<G> {
        self.axis(2)
    }
}

impl<G, L, const D: usize> Clone for Frame<G, L, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, L, const D: usize> Copy for Frame<G, L, D> {}

impl<G, L, const D: usize> PartialEq for Frame<G, L, D> {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.basis == other.basis
    }
}

impl<G, L, const D: usize> fmt::Debug for Frame<G, L, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("origin", &self.origin)
            .field("basis", &self.basis.as_slice())
            .finish()
    }
}

// ── Conversions ────────────────────────────────────────────────────────────

impl<C, const D: usize> Point<C, D> {
    /// Express this point in the local coordinates of `frame`.
    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> Point<L, D> {
        Point::from_coords(frame.to_local(self.coords()))
    }

    /// Take local coordinates in `frame` back to the frame's global system.
    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> Point<G, D> {
        Point::from_coords(frame.to_global(self.coords()))
    }
}

impl<C, const D: usize> Vector<C, D> {
    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> Vector<L, D> {
        Vector::from_components(frame.vector_to_local(&self.components()))
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> Vector<G, D> {
        Vector::from_components(frame.vector_to_global(&self.components()))
    }
}

impl<C, const D: usize> Direction<C, D> {
    pub fn relative_to<L>(&self, frame: &Frame<C, L, D>) -> Direction<L, D> {
        Direction::unchecked(frame.vector_to_local(&self.components()))
    }

    pub fn place_in<G>(&self, frame: &Frame<G, C, D>) -> Direction<G, D> {
        Direction::unchecked(frame.vector_to_global(&self.components()))
    }
}

/// A planar 2D coordinate system embedded in 3D space.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", try_from = "SketchPlaneData<Global>")]
pub struct SketchPlane<Global, Local> {
    origin: Point3d<Global>,
    x_direction: Direction3d<Global>,
    y_direction: Direction3d<Global>,
    #[serde(skip)]
    local: PhantomData<Local>,
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct SketchPlaneData<Global> {
    origin: Point3d<Global>,
    x_direction: Direction3d<Global>,
    y_direction: Direction3d<Global>,
}

impl<G, L> TryFrom<SketchPlaneData<G>> for SketchPlane<G, L> {
    type Error = CurveError;

    fn try_from(data: SketchPlaneData<G>) -> Result<Self> {
        Self::new(data.origin, data.x_direction, data.y_direction)
    }
}

impl<G, L> SketchPlane<G, L> {
    pub fn new(
        origin: Point3d<G>,
        x_direction: Direction3d<G>,
        y_direction: Direction3d<G>,
    ) -> Result<Self> {
        if x_direction.components().dot(&y_direction.components()).abs() > ORTHONORMAL_TOLERANCE {
            return Err(CurveError::invalid_frame("sketch plane axes are not perpendicular"));
        }
        Ok(Self {
            origin,
            x_direction,
            y_direction,
            local: PhantomData,
        })
    }

    /// The global XY plane.
    pub fn xy() -> Self {
        Self {
            origin: Point3d::origin(),
            x_direction: Direction3d::x(),
            y_direction: Direction3d::y(),
            local: PhantomData,
        }
    }

    pub fn origin(&self) -> Point3d<G> {
        self.origin
    }

    pub fn x_direction(&self) -> Direction3d<G> {
        self.x_direction
    }

    pub fn y_direction(&self) -> Direction3d<G> {
        self.y_direction
    }

    pub fn normal(&self) -> Direction3d<G> {
        Direction::unchecked(self.x_direction.components().cross(&self.y_direction.components()))
    }

    /// Local 2D coordinates of the orthogonal projection of `point`.
    pub fn project_into(&self, point: &Point3d<G>) -> Point2d<L> {
        let offset = point.coords() - self.origin.coords();
        Point2d::new(
            offset.dot(&self.x_direction.components()),
            offset.dot(&self.y_direction.components()),
        )
    }

    pub fn project_vector_into(&self, vector: &Vector3d<G>) -> Vector2d<L> {
        let v = vector.components();
        Vector2d::new(
            v.dot(&self.x_direction.components()),
            v.dot(&self.y_direction.components()),
        )
    }

    /// The 3D point at local coordinates `point`.
    pub fn place(&self, point: &Point2d<L>) -> Point3d<G> {
        let c = point.coords();
        Point3d::from_coords(
            self.origin.coords()
                + self.x_direction.components() * c[0]
                + self.y_direction.components() * c[1],
        )
    }

    pub fn place_vector(&self, vector: &Vector2d<L>) -> Vector3d<G> {
        let c = vector.components();
        Vector3d::from_components(
            self.x_direction.components() * c[0] + self.y_direction.components() * c[1],
        )
    }

    /// Orthogonal projection of `point` onto the plane, staying in 3D.
    pub fn project_onto(&self, point: &Point3d<G>) -> Point3d<G> {
        self.place(&self.project_into(point))
    }
}

impl<G, L> Clone for SketchPlane<G, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, L> Copy for SketchPlane<G, L> {}

impl<G, L> fmt::Debug for SketchPlane<G, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SketchPlane")
            .field("origin", &self.origin)
            .field("x_direction", &self.x_direction)
            .field("y_direction", &self.y_direction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Angle;
    use approx::assert_abs_diff_eq;

    enum World {}
    enum Local {}

    #[test]
    fn test_frame2d_round_trip() {
        let frame = Frame2d::<World, Local>::new(
            Point2d::new(1.0, 2.0),
            Direction2d::from_angle(Angle::degrees(30.0)),
        );
        let p = Point2d::<World>::new(-3.0, 0.5);
        let local = p.relative_to(&frame);
        assert_abs_diff_eq!(local.place_in(&frame), p, epsilon = 1e-12);
    }

    #[test]
    fn test_frame2d_axes() {
        let frame = Frame2d::<World, Local>::new(Point2d::new(1.0, 1.0), Direction2d::y());
        let p = Point2d::<World>::new(1.0, 3.0);
        assert_abs_diff_eq!(p.relative_to(&frame), Point2d::new(2.0, 0.0), epsilon = 1e-15);
        let v = Vector2d::<World>::new(0.0, 1.0);
        assert_abs_diff_eq!(v.relative_to(&frame), Vector2d::new(1.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_frame3d_rejects_parallel_axes() {
        let result = Frame3d::<World, Local>::new(Point3d::origin(), Direction3d::x(), Direction3d::x());
        assert!(matches!(result, Err(CurveError::InvalidFrame { .. })));
    }

    #[test]
    fn test_frame3d_rejects_skew_axes() {
        let skew = Vector3d::<World>::new(1.0, 1.0, 0.0).direction().unwrap();
        let result = Frame3d::<World, Local>::new(Point3d::origin(), Direction3d::x(), skew);
        assert!(result.is_err());
    }

    #[test]
    fn test_frame3d_round_trip() {
        let frame = Frame3d::<World, Local>::new(
            Point3d::new(1.0, -2.0, 0.5),
            Direction3d::y(),
            Direction3d::z(),
        )
        .unwrap();
        assert_eq!(frame.z_direction(), Direction3d::x());
        let p = Point3d::<World>::new(0.3, 0.2, 0.1);
        assert_abs_diff_eq!(p.relative_to(&frame).place_in(&frame), p, epsilon = 1e-12);
    }

    #[test]
    fn test_sketch_plane_projection() {
        let plane = SketchPlane::<World, Local>::new(
            Point3d::new(0.0, 0.0, 2.0),
            Direction3d::x(),
            Direction3d::y(),
        )
        .unwrap();
        let p = Point3d::<World>::new(1.0, 2.0, 7.0);
        assert_eq!(plane.project_into(&p), Point2d::new(1.0, 2.0));
        assert_eq!(plane.project_onto(&p), Point3d::new(1.0, 2.0, 2.0));
        assert_eq!(plane.place(&Point2d::new(3.0, 4.0)), Point3d::new(3.0, 4.0, 2.0));
        assert_eq!(plane.normal(), Direction3d::z());
    }

    #[test]
    fn test_sketch_plane_rejects_skew_axes() {
        let skew = Vector3d::<World>::new(1.0, 1.0, 0.0).direction().unwrap();
        assert!(SketchPlane::<World, Local>::new(Point3d::origin(), Direction3d::x(), skew).is_err());
    }

    #[test]
    fn test_deserialize_rejects_skewed_axes() {
        let frame = Frame2d::<World, Local>::new(Point2d::new(1.0, 2.0), Direction2d::y());
        let mut json = serde_json::to_value(frame).unwrap();
        let restored: Frame2d<World, Local> = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored.origin(), frame.origin());
        json["basis"] = serde_json::json!([1.0, 0.0, 1.0, 1.0]);
        assert!(serde_json::from_value::<Frame2d<World, Local>>(json).is_err());

        let mut plane = serde_json::to_value(SketchPlane::<World, Local>::xy()).unwrap();
        plane["y_direction"] = serde_json::to_value(Direction3d::<World>::x()).unwrap();
        assert!(serde_json::from_value::<SketchPlane<World, Local>>(plane).is_err());
    }
}
