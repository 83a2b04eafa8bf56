//! Decision engine implementations.
//!
//! [`HttpDecisionEngine`] talks to a remote policy decision point;
//! [`CedarDecisionEngine`] evaluates the same requests in-process.

mod cedar;
mod http;

pub use cedar::{
    CedarDecisionEngine, OWNER_ACTIONS_POLICY_ID, PUBLIC_ACTIONS_POLICY_ID, pet_videos_policies,
};
pub use http::{HttpDecisionEngine, HttpEngineConfig};
