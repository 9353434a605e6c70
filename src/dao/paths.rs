//! Typed document and collection addresses.
//!
//! The store alternates collection and document segments
//! (`courses/{id}/modules/{id}/gameAssessments/{id}`), so the two path kinds
//! are separate types and conversion between them always appends exactly one
//! segment. Segment hygiene (non-empty, no `/`) is enforced by the accessors
//! before a path is built; see `services::validation`.

use std::fmt;

/// Address of a collection: an odd number of `/`-joined segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Address of a single document: an even number of `/`-joined segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl CollectionPath {
    /// Start a path at a top-level collection.
    pub fn root(name: impl Into<String>) -> Self {
        CollectionPath(name.into())
    }

    /// Address a document inside this collection.
    pub fn document(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    /// The path relative to the store root.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final segment: the collection's own id.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Path of the parent document, or `None` for a top-level collection.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }
}

impl DocumentPath {
    /// Address a subcollection under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    /// The path relative to the store root.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final segment: the document id.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
