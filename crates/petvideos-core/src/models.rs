//! Domain models for PetVideos authorization.
//!
//! These are the core types shared across all crates.

pub mod hierarchy;
pub mod vertex;
