//! Attribute names and attribute categories.

use std::borrow::Cow;
use std::fmt;

/// Name of a per-element attribute.
///
/// This is an open enumeration: the well-known names are associated
/// constants, and any other string can be used via [`Attribute::named`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribute(Cow<'static, str>);

impl Attribute {
    pub const COORDINATES: Attribute = Attribute(Cow::Borrowed("coordinates"));
    pub const NORMALS: Attribute = Attribute(Cow::Borrowed("normals"));
    pub const COLORS: Attribute = Attribute(Cow::Borrowed("colors"));
    pub const TEXTURE_COORDINATES: Attribute = Attribute(Cow::Borrowed("texture coordinates"));
    pub const INDICES: Attribute = Attribute(Cow::Borrowed("indices"));
    pub const LABELS: Attribute = Attribute(Cow::Borrowed("labels"));
    pub const RELATIVE_RADII: Attribute = Attribute(Cow::Borrowed("relative radii"));

    /// Creates a free-form attribute name.
    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

/// The element category an attribute is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Vertex,
    Edge,
    Face,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Vertex, Category::Edge, Category::Face];

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Category::Vertex => 0,
            Category::Edge => 1,
            Category::Face => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Vertex => "vertex",
            Category::Edge => "edge",
            Category::Face => "face",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_attribute_equals_constant_with_same_name() {
        assert_eq!(Attribute::named("coordinates"), Attribute::COORDINATES);
        assert_ne!(Attribute::named("weights"), Attribute::NORMALS);
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::Edge.to_string(), "edge");
    }
}
