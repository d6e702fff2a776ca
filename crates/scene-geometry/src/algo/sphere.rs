//! Geodesic spheres from repeatedly refined icosahedra.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::rc::Rc;

use super::edges::count_edges;
use super::normalize_row;
use super::primitives::{icosahedron_vertices, ICOSAHEDRON_FACES};
use super::refine::subdivide;
use crate::attribute::Attribute;
use crate::error::{GeometryError, Result};
use crate::factory::{FaceAttributes, GeometryFactory, IndexedFaceSetFactory, VertexAttributes};
use crate::geometry::Geometry;

/// Refinement levels above this are clamped.
pub const MAX_SPHERE_LEVEL: usize = 8;

/// Which coordinates the texture coordinates are read from.
///
/// `u` is the longitude `atan2(p[longitude.1], p[longitude.0])` mapped to
/// `[0, 1]`, `v` the latitude towards `p[latitude]` mapped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureChannels {
    pub longitude: (usize, usize),
    pub latitude: usize,
}

impl Default for TextureChannels {
    fn default() -> Self {
        Self {
            longitude: (0, 1),
            latitude: 2,
        }
    }
}

impl TextureChannels {
    pub fn texture_coordinate(&self, p: &[f64]) -> Result<[f64; 2]> {
        let channel = |channel: usize| {
            p.get(channel)
                .copied()
                .ok_or(GeometryError::MissingChannel { channel, len: p.len() })
        };
        let (a, b) = (channel(self.longitude.0)?, channel(self.longitude.1)?);
        let longitude = b.atan2(a);
        let latitude = channel(self.latitude)?.atan2(a.hypot(b));
        Ok([(longitude + PI) / TAU, (latitude + FRAC_PI_2) / PI])
    }
}

/// Unit spheres by refinement level, built on first use.
///
/// [`SphereCache::shared`] hands out the same geometry for a level until
/// [`SphereCache::dispose`]; callers that want to modify a sphere take an
/// [`SphereCache::independent`] copy.
#[derive(Debug, Default)]
pub struct SphereCache {
    channels: TextureChannels,
    levels: Vec<Option<Rc<Geometry>>>,
}

impl SphereCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(channels: TextureChannels) -> Self {
        Self {
            channels,
            levels: Vec::new(),
        }
    }

    pub fn channels(&self) -> TextureChannels {
        self.channels
    }

    /// The cached sphere for `level`, clamped to [`MAX_SPHERE_LEVEL`].
    pub fn shared(&mut self, level: usize) -> Result<Rc<Geometry>> {
        let level = level.min(MAX_SPHERE_LEVEL);
        if let Some(Some(sphere)) = self.levels.get(level) {
            return Ok(Rc::clone(sphere));
        }
        let sphere = icosahedral_sphere(level, self.channels)?;
        if self.levels.len() <= level {
            self.levels.resize(level + 1, None);
        }
        self.levels[level] = Some(Rc::clone(&sphere));
        Ok(sphere)
    }

    /// A copy of the sphere for `level` that shares nothing with the cache.
    pub fn independent(&mut self, level: usize) -> Result<Geometry> {
        self.shared(level)?.duplicate()
    }

    /// Drops every cached sphere.
    pub fn dispose(&mut self) {
        self.levels.clear();
    }

    pub fn is_cached(&self, level: usize) -> bool {
        matches!(self.levels.get(level.min(MAX_SPHERE_LEVEL)), Some(Some(_)))
    }
}

/// An icosahedron refined `level` times and projected onto the unit sphere
/// after every step, with edges, face normals, vertex normals and
/// longitude/latitude texture coordinates.
pub fn icosahedral_sphere(level: usize, channels: TextureChannels) -> Result<Rc<Geometry>> {
    let mut coordinates = icosahedron_vertices();
    let mut faces: Vec<[i32; 3]> = ICOSAHEDRON_FACES.to_vec();
    for step in 0..level {
        let rows: Vec<Vec<i32>> = faces.iter().map(|f| f.to_vec()).collect();
        let capacity = coordinates.len() + count_edges(&rows);
        let attributes = BTreeMap::from([(Attribute::COORDINATES, coordinates.clone())]);
        let Some(mut refined) = subdivide(coordinates.len(), attributes, &faces, capacity) else {
            log::warn!("sphere refinement stopped at step {step} of {level}: out of vertex capacity");
            break;
        };
        coordinates = refined.attributes.remove(&Attribute::COORDINATES).unwrap_or_default();
        coordinates.iter_mut().for_each(|p| normalize_row(p));
        faces = refined.faces;
    }
    log::debug!(
        "sphere level {level}: {} vertices, {} faces",
        coordinates.len(),
        faces.len()
    );

    let uv: Vec<Vec<f64>> = coordinates
        .iter()
        .map(|p| channels.texture_coordinate(p).map(|uv| uv.to_vec()))
        .collect::<Result<_>>()?;
    let mut factory = IndexedFaceSetFactory::new();
    factory.set_vertex_coordinates(coordinates.clone())?;
    factory.set_vertex_normals(coordinates)?;
    factory.set_vertex_texture_coordinates(uv)?;
    factory.set_face_indices(faces.into_iter().map(Vec::from).collect::<Vec<_>>())?;
    factory.set_generate_edges_from_faces(true);
    factory.set_generate_face_normals(true);
    factory.update()?;
    let sphere = factory.geometry();
    sphere.set_name(format!("sphere {level}"));
    Ok(sphere)
}
