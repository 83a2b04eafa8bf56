//! Graph store implementations.
//!
//! Both backends implement the read-only
//! [`GraphStore`](petvideos_core::repository::GraphStore) used on the
//! authorization path, plus [`GraphWriter`] for seeding and tests.

mod graph;
mod memory;

use petvideos_core::models::vertex::{EdgeKind, NewVertex, VertexRef};

use crate::error::DbError;

pub use graph::SurrealGraphStore;
pub use memory::MemoryGraphStore;

/// Mutation side of the graph.
pub trait GraphWriter: Send + Sync {
    fn create_vertex(&self, input: NewVertex)
    -> impl Future<Output = Result<VertexRef, DbError>> + Send;

    /// Create the edge `from -[edge]-> to`. Both endpoints must exist and
    /// the edge must be well-typed for their kinds.
    fn relate(
        &self,
        from: &VertexRef,
        edge: EdgeKind,
        to: &VertexRef,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

fn check_edge(from: &VertexRef, edge: EdgeKind, to: &VertexRef) -> Result<(), DbError> {
    if edge.connects(from.kind, to.kind) {
        Ok(())
    } else {
        Err(DbError::InvalidEdge {
            from: from.kind,
            edge,
            to: to.kind,
        })
    }
}
