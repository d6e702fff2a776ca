//! Ray picking.
//!
//! [`AabbPickSystem::compute_pick`] walks a scene, moves the ray into each
//! geometry's object coordinates and collects [`Hit`]s against faces,
//! polylines, points and the built-in primitives. Faces are tested through
//! an [`AabbTree`] when one is available and one by one otherwise.

mod aabb;
mod hit;
mod info;
pub mod intersect;
mod polygon;
mod system;
mod tree;

pub use aabb::Aabb;
pub use hit::{Hit, PickType};
pub use info::PickInfo;
pub use intersect::{ObjectHit, Ray};
pub use polygon::TreePolygon;
pub use system::{AabbPickSystem, PickConfig};
pub use tree::{AabbNode, AabbTree, DEFAULT_MAX_POLYS_PER_LEAF};
