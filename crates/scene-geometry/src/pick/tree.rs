//! Bounding volume tree over the faces of one face set.

use super::intersect::{intersect_polygon, ObjectHit, Ray};
use super::{Aabb, TreePolygon};
use crate::attribute::{Attribute, Category};
use crate::error::{GeometryError, Result};
use crate::geometry::Geometry;

/// Default leaf threshold.
pub const DEFAULT_MAX_POLYS_PER_LEAF: usize = 10;

/// A node covering the polygon range `start..end`.
///
/// Leaves hold their range directly; inner nodes split it at the median.
#[derive(Debug, Clone, PartialEq)]
pub struct AabbNode {
    bounds: Aabb,
    start: usize,
    end: usize,
    children: Option<Box<(AabbNode, AabbNode)>>,
}

impl AabbNode {
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<(&AabbNode, &AabbNode)> {
        self.children.as_deref().map(|(left, right)| (left, right))
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children().map_or(0, |(l, r)| l.node_count() + r.node_count())
    }

    /// Height of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map_or(0, |(l, r)| l.depth().max(r.depth()))
    }
}

/// An AABB tree over [`TreePolygon`]s.
///
/// The polygons live in one array, sorted in place during construction so
/// that every node's polygons are contiguous. An empty tree is the null
/// tree, which tells callers to fall back to brute force.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AabbTree {
    polygons: Vec<TreePolygon>,
    root: Option<AabbNode>,
}

impl AabbTree {
    /// The "no tree available" sentinel.
    pub fn null() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.root.is_none()
    }

    pub fn build(mut polygons: Vec<TreePolygon>, max_polys_per_leaf: usize) -> Self {
        if polygons.is_empty() {
            return Self::null();
        }
        let count = polygons.len();
        let root = build_node(&mut polygons, 0, count, max_polys_per_leaf);
        log::debug!(
            "built AABB tree over {count} polygons: {} nodes, depth {}",
            root.node_count(),
            root.depth()
        );
        Self {
            polygons,
            root: Some(root),
        }
    }

    /// Builds a tree from coordinate and face index rows.
    pub fn from_faces(vertices: &[Vec<f64>], faces: &[Vec<i32>], max_polys_per_leaf: usize) -> Self {
        Self::build(TreePolygon::from_faces(vertices, faces), max_polys_per_leaf)
    }

    /// Builds a tree from the faces of a face set.
    ///
    /// A geometry without faces yields the null tree.
    pub fn from_geometry(geometry: &Geometry, max_polys_per_leaf: usize) -> Result<Self> {
        let reader = geometry.read()?;
        let Some(faces) = reader.i32_rows(Category::Face, &Attribute::INDICES) else {
            return Ok(Self::null());
        };
        let vertices = reader
            .f64_rows(Category::Vertex, &Attribute::COORDINATES)
            .ok_or(GeometryError::MissingAttribute {
                category: Category::Vertex,
                attribute: Attribute::COORDINATES,
            })?;
        Ok(Self::from_faces(&vertices, &faces, max_polys_per_leaf))
    }

    #[inline]
    pub fn root(&self) -> Option<&AabbNode> {
        self.root.as_ref()
    }

    /// Polygons in tree order.
    #[inline]
    pub fn polygons(&self) -> &[TreePolygon] {
        &self.polygons
    }

    /// Collects the face hits of `ray`, skipping subtrees the ray misses.
    pub fn intersect(&self, ray: &Ray, hits: &mut Vec<ObjectHit>) {
        let Some(root) = &self.root else {
            return;
        };
        let origin = ray.origin();
        let direction = ray.direction();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !node.bounds.intersects_ray(&origin, &direction) {
                continue;
            }
            match node.children() {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => {
                    for polygon in &self.polygons[node.range()] {
                        intersect_polygon(polygon, ray, hits);
                    }
                }
            }
        }
    }
}

fn build_node(polygons: &mut [TreePolygon], start: usize, end: usize, max_polys_per_leaf: usize) -> AabbNode {
    let bounds = Aabb::from_polygons(&polygons[start..end]);
    let count = end - start;
    if count < max_polys_per_leaf || count < 2 {
        return AabbNode {
            bounds,
            start,
            end,
            children: None,
        };
    }

    let axis = bounds.longest_axis();
    let center = bounds.center()[axis];
    polygons[start..end].sort_by(|a, b| {
        let pa = a.centroid()[axis] - center;
        let pb = b.centroid()[axis] - center;
        pa.total_cmp(&pb)
    });

    let mid = (start + end) / 2;
    let left = build_node(polygons, start, mid, max_polys_per_leaf);
    let right = build_node(polygons, mid, end, max_polys_per_leaf);
    AabbNode {
        bounds,
        start,
        end,
        children: Some(Box::new((left, right))),
    }
}
