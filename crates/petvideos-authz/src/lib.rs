//! PetVideos Authz — relationship-based authorization over the
//! directory/video graph.
//!
//! One check runs `RESOLVE_ACTION → VALIDATE_RESOURCE_EXISTS →
//! RESOLVE_HIERARCHY → BUILD_ENTITY_CONTEXT → EVALUATE_DECISION` in a
//! single pass; see [`AuthorizationService::authorize`].

pub mod action;
pub mod config;
pub mod decision;
pub mod engine;
pub mod entity;
pub mod error;
pub mod principal;
pub mod resolver;
pub mod service;

pub use action::Action;
pub use config::AuthzConfig;
pub use decision::{Decision, DecisionClient, DecisionEngine, Verdict};
pub use engine::{CedarDecisionEngine, HttpDecisionEngine, HttpEngineConfig};
pub use entity::{AttributeValue, EntityContextBuilder, EntityIdentifier};
pub use error::DecisionError;
pub use resolver::HierarchyResolver;
pub use service::{AuthorizationOutcome, AuthorizationService};
