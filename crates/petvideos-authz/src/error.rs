//! Decision engine error types.

use petvideos_core::error::PetVideosError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision engine unreachable: {0}")]
    Unavailable(String),

    #[error("decision request rejected: {0}")]
    InvalidRequestShape(String),

    #[error("malformed decision response: {0}")]
    InvalidResponse(String),

    #[error("identity token rejected: {0}")]
    InvalidToken(String),
}

impl From<DecisionError> for PetVideosError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::Unavailable(_) | DecisionError::InvalidResponse(_) => {
                PetVideosError::PolicyEngineUnavailable(err.to_string())
            }
            DecisionError::InvalidRequestShape(msg) => PetVideosError::InvalidRequestShape(msg),
            DecisionError::InvalidToken(msg) => PetVideosError::Unauthenticated(msg),
        }
    }
}
