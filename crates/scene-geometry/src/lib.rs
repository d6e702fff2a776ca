//! Scene-graph geometry: typed attribute containers, point/line/face set
//! entities, staged factories, subdivision, bounding boxes and AABB-tree
//! accelerated picking.

pub mod algo;
pub mod attribute;
pub mod bounds;
pub mod data;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod math;
pub mod pick;
pub mod scene;

pub use attribute::{Attribute, Category};
pub use bounds::{BoundingBoxTraversal, Rectangle3D};
pub use data::DataList;
pub use error::{GeometryError, Result};
pub use factory::{
    EdgeAttributes, FaceAttributes, GeometryFactory, IndexedFaceSetFactory, IndexedLineSetFactory, PointSetFactory,
    QuadMeshFactory, VertexAttributes,
};
pub use geometry::{Geometry, GeometryKind};
pub use math::Metric;
pub use pick::{AabbPickSystem, AabbTree, Hit, PickConfig, PickType};
pub use scene::{Appearance, SceneComponent};
