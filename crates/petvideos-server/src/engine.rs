//! Decision engine selected at startup.

use petvideos_authz::decision::{DecisionRequest, DecisionResponse};
use petvideos_authz::{CedarDecisionEngine, DecisionEngine, DecisionError, HttpDecisionEngine};

pub enum Engine {
    Remote(HttpDecisionEngine),
    Embedded(CedarDecisionEngine),
}

impl Engine {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remote(_) => "http",
            Self::Embedded(_) => "cedar",
        }
    }
}

impl DecisionEngine for Engine {
    async fn is_authorized_with_token(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        match self {
            Self::Remote(engine) => engine.is_authorized_with_token(request).await,
            Self::Embedded(engine) => engine.is_authorized_with_token(request).await,
        }
    }
}
