//! Edge extraction from face loops.

use std::collections::HashSet;

/// The unique edges of a set of faces in first-seen order.
///
/// Each face contributes its consecutive vertex pairs plus the closing pair.
/// Two pairs are the same edge regardless of direction; the orientation of
/// the first occurrence is kept.
pub fn edges_from_faces(faces: &[Vec<i32>]) -> Vec<[i32; 2]> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for face in faces {
        let n = face.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = face[i];
            let b = face[(i + 1) % n];
            if a == b {
                continue;
            }
            if seen.insert((a.min(b), a.max(b))) {
                edges.push([a, b]);
            }
        }
    }
    edges
}

/// Number of distinct edges, without materialising them.
pub fn count_edges(faces: &[Vec<i32>]) -> usize {
    let mut seen = HashSet::new();
    for face in faces {
        let n = face.len();
        for i in 0..n {
            let (a, b) = (face[i], face[(i + 1) % n]);
            if a != b {
                seen.insert((a.min(b), a.max(b)));
            }
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_is_emitted_once() {
        let faces = vec![vec![0, 1, 2], vec![2, 1, 3]];
        let edges = edges_from_faces(&faces);
        assert_eq!(edges, vec![[0, 1], [1, 2], [2, 0], [1, 3], [3, 2]]);
        assert_eq!(count_edges(&faces), 5);
    }

    #[test]
    fn cube_has_twelve_edges() {
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        assert_eq!(edges_from_faces(&faces).len(), 12);
    }
}
