//! PetVideos Core — domain models, graph store traits and the error
//! taxonomy shared by every crate in the workspace.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ErrorKind, PetVideosError, PetVideosResult};
