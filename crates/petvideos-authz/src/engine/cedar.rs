//! In-process decision engine backed by Cedar.
//!
//! Evaluates the same token-based requests a remote policy store would:
//! the principal is read from the identity token, the entity list comes
//! from the request, and action-group membership is supplied here.

use std::str::FromStr;

use cedar_policy::{
    Authorizer, Context, Decision as CedarDecision, Entities, EntityId, EntityTypeName, EntityUid,
    Policy, PolicyId, PolicySet, Request,
};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::action::{Action, OWNER_ACTIONS, PUBLIC_ACTIONS};
use crate::decision::{
    DecisionEngine, DecisionRequest, DecisionResponse, DeterminingPolicy, EvaluationError, Verdict,
};
use crate::entity::{AttributeValue, EntityIdentifier};
use crate::error::DecisionError;
use crate::principal::principal_from_token;

pub const OWNER_ACTIONS_POLICY_ID: &str = "owner-actions";
pub const PUBLIC_ACTIONS_POLICY_ID: &str = "public-actions";

/// The two static policies of the pet videos application, scoped to
/// everything under the root directory.
pub fn pet_videos_policies(namespace: &str, root_directory_id: &str) -> Vec<(String, String)> {
    vec![
        (
            OWNER_ACTIONS_POLICY_ID.to_string(),
            format!(
                "permit(principal, action in [{namespace}::Action::\"{OWNER_ACTIONS}\"], \
                 resource in {namespace}::Directory::\"{root_directory_id}\") \
                 when {{ resource has owner && principal in resource.owner }};"
            ),
        ),
        (
            PUBLIC_ACTIONS_POLICY_ID.to_string(),
            format!(
                "permit(principal, action in [{namespace}::Action::\"{PUBLIC_ACTIONS}\"], \
                 resource in {namespace}::Directory::\"{root_directory_id}\") \
                 when {{ resource has isPublic && resource.isPublic == true }};"
            ),
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct CedarDecisionEngine {
    policy_store_id: String,
    namespace: String,
    policies: PolicySet,
}

impl CedarDecisionEngine {
    /// Build an engine from `(policy id, policy source)` pairs.
    pub fn new(
        policy_store_id: impl Into<String>,
        namespace: impl Into<String>,
        policies: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, DecisionError> {
        let mut set = PolicySet::new();
        for (id, src) in policies {
            let policy = Policy::parse(Some(PolicyId::new(&id)), &src)
                .map_err(|e| DecisionError::InvalidRequestShape(format!("policy {id}: {e}")))?;
            set.add(policy)
                .map_err(|e| DecisionError::InvalidRequestShape(format!("policy {id}: {e}")))?;
        }
        Ok(Self {
            policy_store_id: policy_store_id.into(),
            namespace: namespace.into(),
            policies: set,
        })
    }

    /// Engine loaded with [`pet_videos_policies`].
    pub fn pet_videos(
        policy_store_id: impl Into<String>,
        namespace: impl Into<String>,
        root_directory_id: &str,
    ) -> Result<Self, DecisionError> {
        let namespace = namespace.into();
        let policies = pet_videos_policies(&namespace, root_directory_id);
        Self::new(policy_store_id, namespace, policies)
    }

    fn uid(entity_type: &str, entity_id: &str) -> Result<EntityUid, DecisionError> {
        let type_name = EntityTypeName::from_str(entity_type).map_err(|e| {
            DecisionError::InvalidRequestShape(format!("entity type {entity_type}: {e}"))
        })?;
        Ok(EntityUid::from_type_name_and_id(type_name, EntityId::new(entity_id)))
    }

    /// Action entities with their group membership.
    fn action_entities(&self) -> Vec<Value> {
        let action_type = format!("{}::Action", self.namespace);
        let groups = [OWNER_ACTIONS, PUBLIC_ACTIONS]
            .into_iter()
            .map(|group| json!({"uid": {"type": action_type, "id": group}, "attrs": {}, "parents": []}));
        let actions = Action::ALL.into_iter().map(|action| {
            let parents: Vec<Value> = action
                .groups()
                .iter()
                .map(|group| json!({"type": action_type, "id": group}))
                .collect();
            json!({"uid": {"type": action_type, "id": action.id()}, "attrs": {}, "parents": parents})
        });
        groups.chain(actions).collect()
    }

    fn entities(&self, request: &DecisionRequest) -> Result<Entities, DecisionError> {
        let mut list = self.action_entities();
        if let Some(defs) = &request.entities {
            list.extend(defs.entity_list.iter().map(|item| {
                let attrs: serde_json::Map<String, Value> = item
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), attribute_json(value)))
                    .collect();
                let parents: Vec<Value> = item.parents.iter().map(uid_json).collect();
                json!({"uid": uid_json(&item.identifier), "attrs": attrs, "parents": parents})
            }));
        }
        Entities::from_json_value(Value::Array(list), None)
            .map_err(|e| DecisionError::InvalidRequestShape(format!("entities: {e}")))
    }
}

fn uid_json(entity: &EntityIdentifier) -> Value {
    json!({"type": entity.entity_type, "id": entity.entity_id})
}

fn attribute_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::String(s) => Value::String(s.clone()),
        AttributeValue::Boolean(b) => Value::Bool(*b),
        AttributeValue::Set(items) => Value::Array(items.iter().map(attribute_json).collect()),
        AttributeValue::EntityIdentifier(e) => json!({"__entity": uid_json(e)}),
    }
}

impl DecisionEngine for CedarDecisionEngine {
    async fn is_authorized_with_token(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        if request.policy_store_id != self.policy_store_id {
            return Err(DecisionError::InvalidRequestShape(format!(
                "unknown policy store {}",
                request.policy_store_id
            )));
        }
        let expected_action_type = format!("{}::Action", self.namespace);
        if request.action.action_type != expected_action_type {
            return Err(DecisionError::InvalidRequestShape(format!(
                "action type {} outside namespace {}",
                request.action.action_type, self.namespace
            )));
        }

        let principal_id = principal_from_token(&request.identity_token)
            .map_err(|e| DecisionError::InvalidToken(e.to_string()))?;
        let principal = Self::uid(&format!("{}::User", self.namespace), &principal_id)?;
        let action = Self::uid(&request.action.action_type, &request.action.action_id)?;
        let resource = Self::uid(&request.resource.entity_type, &request.resource.entity_id)?;
        let entities = self.entities(request)?;

        let cedar_request = Request::new(principal, action, resource, Context::empty(), None)
            .map_err(|e| DecisionError::InvalidRequestShape(e.to_string()))?;

        let response = Authorizer::new().is_authorized(&cedar_request, &self.policies, &entities);

        let errors: Vec<EvaluationError> = response
            .diagnostics()
            .errors()
            .map(|e| EvaluationError {
                error_description: e.to_string(),
            })
            .collect();
        for error in &errors {
            warn!(error = %error.error_description, "Cedar evaluation error");
        }

        let mut determining: Vec<String> = response
            .diagnostics()
            .reason()
            .map(|id| id.to_string())
            .collect();
        determining.sort();

        let decision = match response.decision() {
            CedarDecision::Allow => Verdict::Allow,
            CedarDecision::Deny => Verdict::Deny,
        };
        debug!(?decision, policies = ?determining, "Cedar decision");

        Ok(DecisionResponse {
            decision,
            determining_policies: determining
                .into_iter()
                .map(|policy_id| DeterminingPolicy { policy_id })
                .collect(),
            errors,
        })
    }
}
