pub mod bounds;
pub mod frame;
pub mod interval;
pub mod point;
pub mod quantity;
pub mod vector;

pub use bounds::{BoundingBox, VectorBox};
pub use frame::{Frame, Frame2d, Frame3d, SketchPlane};
pub use interval::Interval;
pub use point::{Point, Point2d, Point3d};
pub use quantity::{Angle, Length, Meters, Quantity, Radians, Unit};
pub use vector::{Direction, Direction2d, Direction3d, Vector, Vector2d, Vector3d};
