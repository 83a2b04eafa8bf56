//! SurrealDB implementation of [`GraphStore`].

use chrono::{DateTime, Utc};
use petvideos_core::error::PetVideosResult;
use petvideos_core::models::vertex::{EdgeKind, NewVertex, VertexKind, VertexRef};
use petvideos_core::repository::{GraphStore, IS_PUBLIC, ScalarValue};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{GraphWriter, check_edge};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct VertexRow {
    record_id: String,
    name: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl VertexRow {
    fn into_vertex(self, kind: VertexKind) -> VertexRef {
        VertexRef {
            kind,
            id: self.record_id,
            name: self.name,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct AttributeRow {
    name: String,
    is_public: Option<bool>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Which end of an edge a traversal starts from.
#[derive(Debug, Clone, Copy)]
enum Direction {
    Out,
    In,
}

/// Record ids are spliced into `RELATE` statements between backticks.
fn escaped_id(id: &str) -> Result<&str, DbError> {
    if id.is_empty() || id.contains('`') {
        return Err(DbError::Row(format!("invalid record id: {id:?}")));
    }
    Ok(id)
}

/// SurrealDB implementation of the graph store.
#[derive(Clone)]
pub struct SurrealGraphStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGraphStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// One-hop traversal over `edge` in the given direction.
    ///
    /// Issues one statement per candidate neighbour table in a single
    /// round trip; results keep table order, then creation order.
    async fn neighbours(
        &self,
        vertex: &VertexRef,
        edge: EdgeKind,
        direction: Direction,
    ) -> Result<Vec<VertexRef>, DbError> {
        let (here, there, from_side, to_side) = match direction {
            Direction::Out => (edge.sources(), edge.targets(), "in", "out"),
            Direction::In => (edge.targets(), edge.sources(), "out", "in"),
        };
        if !here.contains(&vertex.kind) {
            return Ok(Vec::new());
        }

        let query = there
            .iter()
            .map(|kind| {
                format!(
                    "SELECT meta::id(id) AS record_id, name, created_at FROM {table} \
                     WHERE id IN (\
                         SELECT VALUE {to_side} FROM {edge_table} \
                         WHERE {from_side} = type::record('{source}', $id)\
                     ) \
                     ORDER BY created_at ASC;",
                    table = kind.label(),
                    edge_table = edge.label(),
                    source = vertex.kind.label(),
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut result = self.db.query(query).bind(("id", vertex.id.clone())).await?;

        let mut neighbours = Vec::new();
        for (idx, kind) in there.iter().enumerate() {
            let rows: Vec<VertexRow> = result.take(idx)?;
            neighbours.extend(rows.into_iter().map(|row| row.into_vertex(*kind)));
        }

        debug!(
            vertex = %vertex.id,
            edge = %edge,
            ?direction,
            count = neighbours.len(),
            "Traversed edge"
        );
        Ok(neighbours)
    }

    async fn lookup(&self, kind: VertexKind, name: &str) -> Result<Option<VertexRef>, DbError> {
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, name, created_at FROM {} \
                 WHERE name = $name",
                kind.label()
            ))
            .bind(("name", name.to_string()))
            .await?;

        let rows: Vec<VertexRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.into_vertex(kind)))
    }

    async fn exists(&self, vertex: &VertexRef) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {table} \
                 WHERE id = type::record('{table}', $id) GROUP ALL",
                table = vertex.kind.label(),
            ))
            .bind(("id", vertex.id.clone()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> GraphStore for SurrealGraphStore<C> {
    async fn find_vertex(&self, kind: VertexKind, name: &str) -> PetVideosResult<Option<VertexRef>> {
        self.lookup(kind, name).await.map_err(Into::into)
    }

    async fn out_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        self.neighbours(vertex, edge, Direction::Out)
            .await
            .map_err(Into::into)
    }

    async fn in_edges(&self, vertex: &VertexRef, edge: EdgeKind) -> PetVideosResult<Vec<VertexRef>> {
        self.neighbours(vertex, edge, Direction::In)
            .await
            .map_err(Into::into)
    }

    async fn attribute(&self, vertex: &VertexRef, name: &str) -> PetVideosResult<Option<ScalarValue>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT name, is_public FROM type::record('{}', $id)",
                vertex.kind.label()
            ))
            .bind(("id", vertex.id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttributeRow> = result.take(0).map_err(DbError::from)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        Ok(match name {
            IS_PUBLIC => row.is_public.map(ScalarValue::Bool),
            "name" => Some(ScalarValue::String(row.name)),
            _ => None,
        })
    }
}

impl<C: Connection> GraphWriter for SurrealGraphStore<C> {
    async fn create_vertex(&self, input: NewVertex) -> Result<VertexRef, DbError> {
        if self.lookup(input.kind, &input.name).await?.is_some() {
            return Err(DbError::Duplicate {
                kind: input.kind,
                name: input.name,
            });
        }

        let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let table = input.kind.label();

        let query = if input.kind.is_resource() {
            format!(
                "CREATE type::record('{table}', $id) SET \
                 name = $name, is_public = $is_public"
            )
        } else {
            format!("CREATE type::record('{table}', $id) SET name = $name")
        };

        let result = self
            .db
            .query(query)
            .bind(("id", id.clone()))
            .bind(("name", input.name.clone()))
            .bind(("is_public", input.is_public))
            .await?;
        result.check().map_err(|e| DbError::Row(e.to_string()))?;

        debug!(kind = %input.kind, id = %id, name = %input.name, "Created vertex");
        Ok(VertexRef {
            kind: input.kind,
            id,
            name: input.name,
        })
    }

    async fn relate(&self, from: &VertexRef, edge: EdgeKind, to: &VertexRef) -> Result<(), DbError> {
        check_edge(from, edge, to)?;
        for vertex in [from, to] {
            if !self.exists(vertex).await? {
                return Err(DbError::VertexNotFound {
                    kind: vertex.kind,
                    id: vertex.id.clone(),
                });
            }
        }

        let query = format!(
            "RELATE {from_tb}:`{from_id}` -> {edge_tb} -> {to_tb}:`{to_id}`;",
            from_tb = from.kind.label(),
            from_id = escaped_id(&from.id)?,
            edge_tb = edge.label(),
            to_tb = to.kind.label(),
            to_id = escaped_id(&to.id)?,
        );

        self.db
            .query(query)
            .await?
            .check()
            .map_err(|e| DbError::Row(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_with_backticks_are_rejected() {
        assert!(escaped_id("us-east-1_pool|sub").is_ok());
        assert!(escaped_id("a`b").is_err());
        assert!(escaped_id("").is_err());
    }
}
