//! Error type shared by the geometry layer.

use crate::attribute::{Attribute, Category};
use crate::geometry::{GeometryId, GeometryKind};

/// Structural-invariant violations.
///
/// Geometric degeneracies never surface here; they are skipped and logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("flat array of length {len} is not divisible by fiber length {fiber}")]
    FiberMismatch { len: usize, fiber: usize },

    #[error("shape {shape:?} declares {expected} values but {actual} were supplied")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("colour rows must have 3 or 4 channels, row {row} has {len}")]
    ColorChannels { row: usize, len: usize },

    #[error("{category} attribute `{attribute}` has {actual} elements but the {category} count is {expected}")]
    CountMismatch {
        category: Category,
        attribute: Attribute,
        expected: usize,
        actual: usize,
    },

    #[error("pending {category} attributes disagree on element count: {}", format_counts(.counts))]
    InconsistentPending {
        category: Category,
        counts: Vec<(Attribute, usize)>,
    },

    #[error("a {kind} carries no {category} attributes")]
    UnsupportedCategory {
        kind: GeometryKind,
        category: Category,
    },

    #[error("{category} attribute `{attribute}` is missing")]
    MissingAttribute {
        category: Category,
        attribute: Attribute,
    },

    #[error("{category} attribute `{attribute}` does not hold {expected} data")]
    WrongStorage {
        category: Category,
        attribute: Attribute,
        expected: &'static str,
    },

    #[error("{category} indices of a quad mesh are derived from its shape and cannot be set")]
    DerivedTopology { category: Category },

    #[error("quad mesh needs at least 2 lines in each direction, got {u_lines}x{v_lines}")]
    QuadMeshShape { u_lines: usize, v_lines: usize },

    #[error("face {face} has {arity} vertices, only triangles are accepted")]
    NonTriangularFace { face: usize, arity: usize },

    #[error("edge {edge} has {len} vertices, only line segments are accepted")]
    NonSegmentEdge { edge: usize, len: usize },

    #[error("index {index} in {category} {element} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        category: Category,
        element: usize,
        index: i32,
        vertex_count: usize,
    },

    #[error("control net of {rows}x{columns} points does not fit degree ({u_degree}, {v_degree})")]
    ControlNet {
        rows: usize,
        columns: usize,
        u_degree: usize,
        v_degree: usize,
    },

    #[error("row {row} is out of range for a list of {len} elements")]
    RowOutOfRange { row: usize, len: usize },

    #[error("coordinate channel {channel} is missing from a {len}-component row")]
    MissingChannel { channel: usize, len: usize },

    #[error("{primitive} needs at least {minimum} segments, got {requested}")]
    TooFewSegments {
        primitive: &'static str,
        requested: usize,
        minimum: usize,
    },

    #[error("geometry {0} is being read, writes are rejected until the reader finishes")]
    ReadInProgress(GeometryId),

    #[error("geometry {0} is being written, reads are rejected until the writer finishes")]
    WriteInProgress(GeometryId),
}

fn format_counts(counts: &[(Attribute, usize)]) -> String {
    counts
        .iter()
        .map(|(attribute, count)| format!("`{attribute}`={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = GeometryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_pending_names_every_attribute() {
        let err = GeometryError::InconsistentPending {
            category: Category::Vertex,
            counts: vec![(Attribute::COORDINATES, 4), (Attribute::COLORS, 3)],
        };
        let message = err.to_string();
        assert!(message.contains("`coordinates`=4"), "{message}");
        assert!(message.contains("`colors`=3"), "{message}");
    }
}
