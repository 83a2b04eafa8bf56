//! In-memory implementation of the graph store.
//!
//! Vertices and edges live in insertion-ordered vectors guarded by a
//! `tokio::sync::RwLock`. Traversals return neighbours in edge insertion
//! order, which is what the resolver reports as discovery order.
//!
//! Not durable: intended for local development and tests. As with the
//! SurrealDB backend, writes only check edge typing; cycles and a second
//! parent are accepted here and reported by the resolver at read time.

use std::collections::HashMap;
use std::sync::Arc;

use petvideos_core::error::PetVideosResult;
use petvideos_core::models::vertex::{EdgeKind, NewVertex, VertexKind, VertexRef};
use petvideos_core::repository::{GraphStore, IS_PUBLIC, ScalarValue};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GraphWriter, check_edge};
use crate::error::DbError;

type VertexKey = (VertexKind, String);

#[derive(Debug)]
struct StoredVertex {
    vertex: VertexRef,
    is_public: bool,
}

#[derive(Debug)]
struct Edge {
    kind: EdgeKind,
    from: VertexKey,
    to: VertexKey,
}

#[derive(Debug, Default)]
struct Graph {
    vertices: Vec<StoredVertex>,
    by_key: HashMap<VertexKey, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    fn get(&self, key: &VertexKey) -> Option<&StoredVertex> {
        self.by_key.get(key).map(|&idx| &self.vertices[idx])
    }
}

fn key_of(vertex: &VertexRef) -> VertexKey {
    (vertex.kind, vertex.id.clone())
}

/// Process-local graph store. Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    graph: Arc<RwLock<Graph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every `from -[edge]-> to` edge. Returns how many were removed.
    pub async fn unrelate(&self, from: &VertexRef, edge: EdgeKind, to: &VertexRef) -> usize {
        let (from, to) = (key_of(from), key_of(to));
        let mut graph = self.graph.write().await;
        let before = graph.edges.len();
        graph
            .edges
            .retain(|e| !(e.kind == edge && e.from == from && e.to == to));
        before - graph.edges.len()
    }

    /// Flip the public flag of a resource.
    pub async fn set_public(&self, vertex: &VertexRef, is_public: bool) -> Result<(), DbError> {
        let mut graph = self.graph.write().await;
        let idx = *graph
            .by_key
            .get(&key_of(vertex))
            .ok_or_else(|| DbError::VertexNotFound {
                kind: vertex.kind,
                id: vertex.id.clone(),
            })?;
        graph.vertices[idx].is_public = is_public;
        Ok(())
    }
}

impl GraphStore for MemoryGraphStore {
    async fn find_vertex(&self, kind: VertexKind, name: &str) -> PetVideosResult<Option<VertexRef>> {
        let graph = self.graph.read().await;
        Ok(graph
            .vertices
            .iter()
            .find(|v| v.vertex.kind == kind && v.vertex.name == name)
            .map(|v| v.vertex.clone()))
    }

    async fn out_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        let key = key_of(vertex);
        let graph = self.graph.read().await;
        Ok(graph
            .edges
            .iter()
            .filter(|e| e.kind == edge && e.from == key)
            .filter_map(|e| graph.get(&e.to))
            .map(|v| v.vertex.clone())
            .collect())
    }

    async fn in_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        let key = key_of(vertex);
        let graph = self.graph.read().await;
        Ok(graph
            .edges
            .iter()
            .filter(|e| e.kind == edge && e.to == key)
            .filter_map(|e| graph.get(&e.from))
            .map(|v| v.vertex.clone())
            .collect())
    }

    async fn attribute(&self, vertex: &VertexRef, name: &str) -> PetVideosResult<Option<ScalarValue>> {
        let graph = self.graph.read().await;
        let Some(stored) = graph.get(&key_of(vertex)) else {
            return Ok(None);
        };
        Ok(match name {
            IS_PUBLIC if stored.vertex.kind.is_resource() => Some(ScalarValue::Bool(stored.is_public)),
            "name" => Some(ScalarValue::String(stored.vertex.name.clone())),
            _ => None,
        })
    }
}

impl GraphWriter for MemoryGraphStore {
    async fn create_vertex(&self, input: NewVertex) -> Result<VertexRef, DbError> {
        let mut graph = self.graph.write().await;
        if graph
            .vertices
            .iter()
            .any(|v| v.vertex.kind == input.kind && v.vertex.name == input.name)
        {
            return Err(DbError::Duplicate {
                kind: input.kind,
                name: input.name,
            });
        }

        let vertex = VertexRef {
            kind: input.kind,
            id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name,
        };
        let idx = graph.vertices.len();
        graph.by_key.insert(key_of(&vertex), idx);
        graph.vertices.push(StoredVertex {
            vertex: vertex.clone(),
            is_public: input.is_public && input.kind.is_resource(),
        });
        Ok(vertex)
    }

    async fn relate(&self, from: &VertexRef, edge: EdgeKind, to: &VertexRef) -> Result<(), DbError> {
        check_edge(from, edge, to)?;
        let mut graph = self.graph.write().await;
        for vertex in [from, to] {
            if graph.get(&key_of(vertex)).is_none() {
                return Err(DbError::VertexNotFound {
                    kind: vertex.kind,
                    id: vertex.id.clone(),
                });
            }
        }
        graph.edges.push(Edge {
            kind: edge,
            from: key_of(from),
            to: key_of(to),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn traversals_follow_edge_direction() {
        let store = MemoryGraphStore::new();
        let alice = store.create_vertex(NewVertex::user("pool|alice", "alice")).await.unwrap();
        let dir = store.create_vertex(NewVertex::directory("d", false)).await.unwrap();
        let video = store.create_vertex(NewVertex::video("v.mp4", true)).await.unwrap();
        store.relate(&alice, EdgeKind::Owner, &video).await.unwrap();
        store.relate(&video, EdgeKind::MemberOf, &dir).await.unwrap();

        assert_eq!(store.in_edges(&video, EdgeKind::Owner).await.unwrap(), vec![alice.clone()]);
        assert_eq!(store.out_edges(&alice, EdgeKind::Owner).await.unwrap(), vec![video.clone()]);
        assert_eq!(store.out_edges(&video, EdgeKind::MemberOf).await.unwrap(), vec![dir.clone()]);
        assert!(store.out_edges(&dir, EdgeKind::MemberOf).await.unwrap().is_empty());
        assert_eq!(
            store.attribute(&video, IS_PUBLIC).await.unwrap(),
            Some(ScalarValue::Bool(true))
        );
        assert_eq!(store.attribute(&alice, IS_PUBLIC).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_ill_typed_edges_and_duplicates() {
        let store = MemoryGraphStore::new();
        let dir = store.create_vertex(NewVertex::directory("d", false)).await.unwrap();
        let video = store.create_vertex(NewVertex::video("v.mp4", false)).await.unwrap();

        let err = store.relate(&dir, EdgeKind::MemberOf, &video).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidEdge { .. }));

        let err = store.create_vertex(NewVertex::directory("d", true)).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn unrelate_removes_edge() {
        let store = MemoryGraphStore::new();
        let bob = store.create_vertex(NewVertex::user("pool|bob", "bob")).await.unwrap();
        let dir = store.create_vertex(NewVertex::directory("d", false)).await.unwrap();
        store.relate(&bob, EdgeKind::Owner, &dir).await.unwrap();

        assert_eq!(store.unrelate(&bob, EdgeKind::Owner, &dir).await, 1);
        assert_eq!(store.unrelate(&bob, EdgeKind::Owner, &dir).await, 0);
        assert!(store.in_edges(&dir, EdgeKind::Owner).await.unwrap().is_empty());
    }
}
