//! PetVideos Database — graph store adapters.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The SurrealDB and in-memory graph stores ([`repository`])
//! - Sample topology seeding ([`bootstrap`])
//! - Error types ([`DbError`])

pub mod bootstrap;
mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{GraphWriter, MemoryGraphStore, SurrealGraphStore};
pub use schema::{run_migrations, schema_v1};
