//! The authorization check exposed to the request dispatcher.

use std::time::Duration;

use petvideos_core::error::{PetVideosError, PetVideosResult};
use petvideos_core::repository::GraphStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::action::Action;
use crate::config::AuthzConfig;
use crate::decision::{Decision, DecisionClient, DecisionEngine, DecisionRequest};
use crate::entity::{EntitiesDefinition, EntityContextBuilder};
use crate::resolver::{HierarchyResolver, store_call};

/// Result of an evaluated check. Failures to evaluate are errors, not
/// outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationOutcome {
    pub allowed: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub determining_policy: Option<String>,
}

impl AuthorizationOutcome {
    fn from_decision(decision: &Decision) -> Self {
        match decision.justification() {
            Some(policy) if decision.is_allowed() => Self {
                allowed: true,
                reason: format!("Access allowed -- determining policy id is {policy}"),
                determining_policy: Some(policy.to_string()),
            },
            _ => Self {
                allowed: false,
                reason: "Access denied -- permissions check failed".into(),
                determining_policy: None,
            },
        }
    }
}

/// Runs the full check pipeline against one graph store and one decision
/// engine. Holds no per-check state; safe to share across tasks.
pub struct AuthorizationService<G: GraphStore, E: DecisionEngine> {
    store: G,
    resolver: HierarchyResolver,
    builder: EntityContextBuilder,
    client: DecisionClient<E>,
    policy_store_id: String,
    store_timeout: Duration,
}

impl<G: GraphStore, E: DecisionEngine> AuthorizationService<G, E> {
    pub fn new(store: G, engine: E, config: &AuthzConfig) -> Self {
        Self {
            store,
            resolver: HierarchyResolver::from_config(config),
            builder: EntityContextBuilder::from_config(config),
            client: DecisionClient::new(engine, config.decision_timeout),
            policy_store_id: config.policy_store_id.clone(),
            store_timeout: config.store_timeout,
        }
    }

    /// Decide whether the token's principal may perform `action` on the
    /// resource named `resource_name`.
    ///
    /// A missing resource fails with `ResourceNotFound` before any
    /// decision request is made. Only an engine DENY yields
    /// `allowed == false`.
    pub async fn authorize(
        &self,
        token: &str,
        action: &str,
        resource_name: &str,
    ) -> PetVideosResult<AuthorizationOutcome> {
        let action: Action = action.parse()?;
        self.authorize_action(token, action, resource_name).await
    }

    pub async fn authorize_action(
        &self,
        token: &str,
        action: Action,
        resource_name: &str,
    ) -> PetVideosResult<AuthorizationOutcome> {
        let result = self.check(token, action, resource_name).await;
        Self::log_result(action, resource_name, &result);
        result
    }

    /// Check an action that names no resource; the request targets the
    /// application placeholder entity and carries no entity list.
    pub async fn authorize_application(
        &self,
        token: &str,
        action: &str,
    ) -> PetVideosResult<AuthorizationOutcome> {
        let action: Action = action.parse()?;
        require_token(token)?;
        let request = DecisionRequest {
            policy_store_id: self.policy_store_id.clone(),
            identity_token: token.to_string(),
            action: self.builder.action(action),
            resource: self.builder.application_entity(),
            entities: None,
        };
        let result = self
            .client
            .evaluate(&request)
            .await
            .map(|decision| AuthorizationOutcome::from_decision(&decision));
        Self::log_result(action, "<application>", &result);
        result
    }

    async fn check(
        &self,
        token: &str,
        action: Action,
        resource_name: &str,
    ) -> PetVideosResult<AuthorizationOutcome> {
        require_token(token)?;

        let kind = action.resource_kind();
        let resource = store_call(
            self.store_timeout,
            "resource lookup",
            self.store.find_vertex(kind, resource_name),
        )
        .await?
        .ok_or_else(|| PetVideosError::ResourceNotFound {
            kind,
            name: resource_name.to_string(),
        })?;

        let hierarchy = self.resolver.resolve(&self.store, &resource).await?;
        let entity = self.builder.build(&hierarchy)?;

        let request = DecisionRequest {
            policy_store_id: self.policy_store_id.clone(),
            identity_token: token.to_string(),
            action: self.builder.action(action),
            resource: entity.identifier.clone(),
            entities: Some(EntitiesDefinition {
                entity_list: vec![entity],
            }),
        };

        let decision = self.client.evaluate(&request).await?;
        Ok(AuthorizationOutcome::from_decision(&decision))
    }

    fn log_result(action: Action, resource: &str, result: &PetVideosResult<AuthorizationOutcome>) {
        match result {
            Ok(outcome) => info!(
                %action,
                resource,
                allowed = outcome.allowed,
                policy = outcome.determining_policy.as_deref(),
                "Authorization decided"
            ),
            Err(e) if e.is_client_error() => info!(
                %action,
                resource,
                kind = ?e.kind(),
                error = %e,
                "Authorization rejected"
            ),
            Err(e) => warn!(
                %action,
                resource,
                kind = ?e.kind(),
                error = %e,
                "Authorization could not be evaluated"
            ),
        }
    }
}

fn require_token(token: &str) -> PetVideosResult<()> {
    if token.trim().is_empty() {
        return Err(PetVideosError::Unauthenticated("missing identity token".into()));
    }
    Ok(())
}
