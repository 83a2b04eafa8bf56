//! Decision requests, responses and the client that submits them.

use std::time::Duration;

use petvideos_core::error::{PetVideosError, PetVideosResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{ActionIdentifier, EntitiesDefinition, EntityIdentifier};
use crate::error::DecisionError;

/// Token-based authorization request, as submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub policy_store_id: String,
    pub identity_token: String,
    pub action: ActionIdentifier,
    pub resource: EntityIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntitiesDefinition>,
}

/// Engine verdict. Serialized as `ALLOW` / `DENY` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Allow,
    Deny,
}

/// A policy that contributed to the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterminingPolicy {
    /// Id of the policy inside the engine's policy store.
    pub policy_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationError {
    pub error_description: String,
}

/// Engine response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub decision: Verdict,
    #[serde(default)]
    pub determining_policies: Vec<DeterminingPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EvaluationError>,
}

/// Interpreted verdict of one decision request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Policies that produced an ALLOW, in engine order. Empty on DENY.
    pub determining_policies: Vec<String>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }

    /// Policy surfaced to the caller as the justification of an ALLOW.
    pub fn justification(&self) -> Option<&str> {
        self.determining_policies.first().map(String::as_str)
    }
}

impl TryFrom<DecisionResponse> for Decision {
    type Error = PetVideosError;

    fn try_from(response: DecisionResponse) -> Result<Self, Self::Error> {
        for error in &response.errors {
            warn!(error = %error.error_description, "Policy evaluation error");
        }
        match response.decision {
            Verdict::Allow if response.determining_policies.is_empty() => {
                Err(PetVideosError::InvalidRequestShape(
                    "ALLOW without a determining policy".into(),
                ))
            }
            Verdict::Allow => Ok(Decision {
                verdict: Verdict::Allow,
                determining_policies: response
                    .determining_policies
                    .into_iter()
                    .map(|p| p.policy_id)
                    .collect(),
            }),
            Verdict::Deny => {
                if !response.determining_policies.is_empty() {
                    debug!(
                        policies = ?response.determining_policies,
                        "DENY carried determining policies"
                    );
                }
                Ok(Decision {
                    verdict: Verdict::Deny,
                    determining_policies: Vec::new(),
                })
            }
        }
    }
}

/// A policy decision point reachable by the client.
pub trait DecisionEngine: Send + Sync {
    fn is_authorized_with_token(
        &self,
        request: &DecisionRequest,
    ) -> impl Future<Output = Result<DecisionResponse, DecisionError>> + Send;
}

/// Submits exactly one request per evaluation; no caching, no batching,
/// no inline retries.
#[derive(Debug, Clone)]
pub struct DecisionClient<E: DecisionEngine> {
    engine: E,
    timeout: Duration,
}

impl<E: DecisionEngine> DecisionClient<E> {
    pub fn new(engine: E, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Evaluate a request. Engine failures and timeouts surface as
    /// `PolicyEngineUnavailable`, never as a DENY.
    pub async fn evaluate(&self, request: &DecisionRequest) -> PetVideosResult<Decision> {
        let response =
            tokio::time::timeout(self.timeout, self.engine.is_authorized_with_token(request))
                .await
                .map_err(|_| {
                    PetVideosError::PolicyEngineUnavailable(format!(
                        "no decision within {:?}",
                        self.timeout
                    ))
                })??;

        Decision::try_from(response)
    }
}
