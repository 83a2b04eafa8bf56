//! Graph store trait definitions for data access abstraction.
//!
//! All operations are async and read-only. Connectivity failures surface as
//! [`PetVideosError::StoreUnavailable`](crate::error::PetVideosError);
//! a missing vertex is `Ok(None)`, not an error.

use serde::{Deserialize, Serialize};

use crate::error::PetVideosResult;
use crate::models::vertex::{EdgeKind, VertexKind, VertexRef};

/// Attribute that marks a resource as publicly readable.
pub const IS_PUBLIC: &str = "isPublic";

/// Scalar attribute value read from a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarValue {
    Bool(bool),
    String(String),
}

pub trait GraphStore: Send + Sync {
    /// Exact-match lookup by kind and name.
    fn find_vertex(
        &self,
        kind: VertexKind,
        name: &str,
    ) -> impl Future<Output = PetVideosResult<Option<VertexRef>>> + Send;

    /// One-hop forward traversal: every `w` with `vertex -[edge]-> w`.
    fn out_edges(
        &self,
        vertex: &VertexRef,
        edge: EdgeKind,
    ) -> impl Future<Output = PetVideosResult<Vec<VertexRef>>> + Send;

    /// One-hop reverse traversal: every `w` with `w -[edge]-> vertex`.
    fn in_edges(
        &self,
        vertex: &VertexRef,
        edge: EdgeKind,
    ) -> impl Future<Output = PetVideosResult<Vec<VertexRef>>> + Send;

    /// Scalar attribute read. `Ok(None)` when the vertex has no such
    /// attribute.
    fn attribute(
        &self,
        vertex: &VertexRef,
        name: &str,
    ) -> impl Future<Output = PetVideosResult<Option<ScalarValue>>> + Send;
}
