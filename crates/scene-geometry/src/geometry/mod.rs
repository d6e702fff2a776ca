//! Point, line and face set entities.
//!
//! One [`Geometry`] type covers all three kinds. The kind decides which
//! attribute categories exist: a point set has vertices, a line set adds
//! edges, a face set adds faces. Each category is an [`AttributeStore`]
//! whose count invariant is enforced on every write.
//!
//! All access goes through scoped sections:
//!
//! ```ignore
//! let geometry = Geometry::point_set();
//! {
//!     let writer = geometry.write()?;
//!     writer.set_count(Category::Vertex, 2)?;
//!     writer.set_attribute(Category::Vertex, Attribute::COORDINATES, coords)?;
//! } // listeners see one event here
//! let reader = geometry.read()?;
//! assert_eq!(reader.vertex_count(), 2);
//! ```

mod lock;
mod store;

pub use lock::{GeometryEvent, GeometryReader, GeometryWriter};
pub use store::AttributeStore;

pub(crate) use store::common_count;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attribute::Category;
use crate::bounds::{Rectangle2D, Rectangle3D};
use crate::error::Result;
use crate::math::Metric;
use crate::pick::AabbTree;

use lock::LockState;

/// Well-known geometry attribute keys.
pub mod keys {
    pub const METRIC: &str = "metric";
    pub const BOUNDING_BOX: &str = "boundingBox";
    pub const QUAD_MESH_SHAPE: &str = "quadMesh";
    pub const HEIGHT_FIELD_SHAPE: &str = "heightField";
    pub const AABB_TREE: &str = "AABBTree";
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a geometry, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which attribute categories a geometry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    PointSet,
    LineSet,
    FaceSet,
}

impl GeometryKind {
    pub fn supports(self, category: Category) -> bool {
        match category {
            Category::Vertex => true,
            Category::Edge => self != GeometryKind::PointSet,
            Category::Face => self == GeometryKind::FaceSet,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryKind::PointSet => "point set",
            GeometryKind::LineSet => "line set",
            GeometryKind::FaceSet => "face set",
        })
    }
}

/// A non-indexed attribute of the whole geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryAttribute {
    Metric(Metric),
    BoundingBox(Rectangle3D),
    QuadMeshShape { u_lines: usize, v_lines: usize },
    /// The vertex z values sample a height field over this domain.
    HeightField(Rectangle2D),
    AabbTree(Rc<AabbTree>),
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GeometryState {
    stores: [AttributeStore; 3],
    attributes: BTreeMap<String, GeometryAttribute>,
}

type Listener = Box<dyn FnMut(&GeometryEvent)>;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

pub struct Geometry {
    id: GeometryId,
    kind: GeometryKind,
    name: RefCell<String>,
    lock: LockState,
    state: RefCell<GeometryState>,
    pending: RefCell<GeometryEvent>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: std::cell::Cell<usize>,
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name.borrow())
            .finish_non_exhaustive()
    }
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            id: GeometryId::next(),
            kind,
            name: RefCell::new(kind.to_string()),
            lock: LockState::default(),
            state: RefCell::new(GeometryState::default()),
            pending: RefCell::new(GeometryEvent::default()),
            listeners: RefCell::new(Vec::new()),
            next_listener: std::cell::Cell::new(0),
        }
    }

    pub fn point_set() -> Self {
        Self::new(GeometryKind::PointSet)
    }

    pub fn line_set() -> Self {
        Self::new(GeometryKind::LineSet)
    }

    pub fn face_set() -> Self {
        Self::new(GeometryKind::FaceSet)
    }

    /// A structurally independent copy with a fresh identity and no listeners.
    pub fn duplicate(&self) -> Result<Self> {
        let _reader = self.read()?;
        let copy = Self::new(self.kind);
        *copy.name.borrow_mut() = self.name.borrow().clone();
        *copy.state.borrow_mut() = self.state.borrow().clone();
        Ok(copy)
    }

    #[inline]
    pub fn id(&self) -> GeometryId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Opens a reader section. Fails while a writer is active.
    pub fn read(&self) -> Result<GeometryReader<'_>> {
        GeometryReader::acquire(self)
    }

    /// Opens a writer section. Fails while a reader is active.
    pub fn write(&self) -> Result<GeometryWriter<'_>> {
        GeometryWriter::acquire(self)
    }

    pub fn add_listener(&self, listener: impl FnMut(&GeometryEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    fn notify(&self, event: &GeometryEvent) {
        log::trace!("geometry {} changed", self.id);
        // Listeners may register further listeners while being called.
        let mut active = std::mem::take(&mut *self.listeners.borrow_mut());
        for (_, listener) in active.iter_mut() {
            listener(event);
        }
        let mut listeners = self.listeners.borrow_mut();
        active.append(&mut listeners);
        *listeners = active;
    }
}
