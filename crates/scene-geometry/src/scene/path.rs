//! Paths from the scene root to a component.

use nalgebra::Matrix4;

/// The components passed on the way down, with accumulated transforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenePath {
    names: Vec<String>,
    /// Cumulative matrix after each component.
    matrices: Vec<Matrix4<f64>>,
}

impl ScenePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component with its local transformation.
    pub fn push(&mut self, name: impl Into<String>, local: Option<&Matrix4<f64>>) {
        let current = self.matrix();
        let next = match local {
            Some(local) => current * local,
            None => current,
        };
        self.names.push(name.into());
        self.matrices.push(next);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.matrices.pop();
        self.names.pop()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn last(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Object-to-world matrix of the last component.
    pub fn matrix(&self) -> Matrix4<f64> {
        self.matrices.last().copied().unwrap_or_else(Matrix4::identity)
    }

    /// World-to-object matrix, `None` for a singular transform.
    pub fn inverse_matrix(&self) -> Option<Matrix4<f64>> {
        self.matrix().try_inverse()
    }
}
