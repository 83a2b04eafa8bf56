//! Database-specific error types and conversions.

use petvideos_core::error::PetVideosError;
use petvideos_core::models::vertex::{EdgeKind, VertexKind};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Malformed row: {0}")]
    Row(String),

    #[error("{edge} cannot connect {from} to {to}")]
    InvalidEdge {
        from: VertexKind,
        edge: EdgeKind,
        to: VertexKind,
    },

    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: VertexKind, name: String },

    #[error("Vertex not found: {kind} with id {id}")]
    VertexNotFound { kind: VertexKind, id: String },
}

impl From<DbError> for PetVideosError {
    fn from(err: DbError) -> Self {
        PetVideosError::StoreUnavailable(err.to_string())
    }
}
