//! Resolved ownership/containment closure of a resource.

use serde::{Deserialize, Serialize};

use super::vertex::VertexRef;

/// Closure of a resource over the containment forest.
///
/// Built fresh for every authorization check and dropped once the
/// decision request has been assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHierarchy {
    /// The resource the closure was computed for.
    pub resource: VertexRef,
    /// Owners of the resource and of every ancestor, deduplicated by id,
    /// in discovery order (direct owners first, then nearest ancestor up).
    pub owners: Vec<VertexRef>,
    /// Ancestor chain from the immediate parent to the root.
    pub ancestors: Vec<VertexRef>,
    pub is_public: bool,
}

impl ResolvedHierarchy {
    pub fn owner_ids(&self) -> impl Iterator<Item = &str> {
        self.owners.iter().map(|o| o.id.as_str())
    }

    pub fn ancestor_ids(&self) -> impl Iterator<Item = &str> {
        self.ancestors.iter().map(|a| a.id.as_str())
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}
