//! Error types for PetVideos authorization.

use thiserror::Error;

use crate::models::vertex::VertexKind;

/// Every failure an authorization check can end in, other than a DENY.
///
/// None of these is ever converted into a refusal: "could not evaluate"
/// and "evaluated and refused" stay distinct all the way to the caller.
#[derive(Debug, Error)]
pub enum PetVideosError {
    #[error("{kind} '{name}' does not exist")]
    ResourceNotFound { kind: VertexKind, name: String },

    #[error("vertex {vertex} is a member of {parents} directories")]
    MalformedHierarchy { vertex: String, parents: usize },

    #[error("ancestor walk from {vertex} exceeded {max_depth} hops")]
    CycleDetected { vertex: String, max_depth: usize },

    #[error("graph store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("policy engine unavailable: {0}")]
    PolicyEngineUnavailable(String),

    #[error("invalid decision request shape: {0}")]
    InvalidRequestShape(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

/// Payload-free discriminant of [`PetVideosError`].
///
/// The request dispatcher maps this onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ResourceNotFound,
    MalformedHierarchy,
    CycleDetected,
    StoreUnavailable,
    PolicyEngineUnavailable,
    InvalidRequestShape,
    UnknownAction,
    Unauthenticated,
}

impl PetVideosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::MalformedHierarchy { .. } => ErrorKind::MalformedHierarchy,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::PolicyEngineUnavailable(_) => ErrorKind::PolicyEngineUnavailable,
            Self::InvalidRequestShape(_) => ErrorKind::InvalidRequestShape,
            Self::UnknownAction(_) => ErrorKind::UnknownAction,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
        }
    }

    /// Whether the failure was caused by the request rather than by the
    /// system (bad resource name, unknown action, missing credentials).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ResourceNotFound | ErrorKind::UnknownAction | ErrorKind::Unauthenticated
        )
    }
}

pub type PetVideosResult<T> = Result<T, PetVideosError>;
