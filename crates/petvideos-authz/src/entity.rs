//! Entity context builder.
//!
//! Translates a [`ResolvedHierarchy`] into the entity/attribute/parent
//! schema carried by a decision request. Pure transformation, no I/O.

use std::collections::BTreeMap;

use petvideos_core::error::{PetVideosError, PetVideosResult};
use petvideos_core::models::hierarchy::ResolvedHierarchy;
use petvideos_core::models::vertex::{VertexKind, VertexRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::config::AuthzConfig;

/// Owner attribute: set of user entity references.
pub const OWNER_ATTRIBUTE: &str = "owner";
/// Public flag attribute.
pub const IS_PUBLIC_ATTRIBUTE: &str = "isPublic";

/// Typed entity reference, `"<namespace>::<Kind>"` plus id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIdentifier {
    pub entity_type: String,
    pub entity_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIdentifier {
    pub action_type: String,
    pub action_id: String,
}

/// Attribute value as carried on the wire.
///
/// Serializes externally tagged: `{"boolean": true}`,
/// `{"set": [...]}`, `{"entityIdentifier": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeValue {
    String(String),
    Boolean(bool),
    Set(Vec<AttributeValue>),
    EntityIdentifier(EntityIdentifier),
}

impl AttributeValue {
    pub fn entity_set(entities: impl IntoIterator<Item = EntityIdentifier>) -> Self {
        Self::Set(entities.into_iter().map(Self::EntityIdentifier).collect())
    }
}

impl TryFrom<Value> for AttributeValue {
    type Error = PetVideosError;

    /// Strings, booleans, arrays and `{entityType, entityId}` objects map
    /// onto the four variants; anything else is rejected.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            Value::Bool(b) => Ok(Self::Boolean(b)),
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Set),
            Value::Object(map) => {
                let is_reference = map.len() == 2
                    && map.get("entityType").is_some_and(Value::is_string)
                    && map.get("entityId").is_some_and(Value::is_string);
                if !is_reference {
                    return Err(PetVideosError::InvalidRequestShape(format!(
                        "object attribute is not an entity reference: {}",
                        Value::Object(map)
                    )));
                }
                serde_json::from_value(Value::Object(map))
                    .map(Self::EntityIdentifier)
                    .map_err(|e| PetVideosError::InvalidRequestShape(e.to_string()))
            }
            other => Err(PetVideosError::InvalidRequestShape(format!(
                "unsupported attribute value: {other}"
            ))),
        }
    }
}

/// One entry of the request's entity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityItem {
    pub identifier: EntityIdentifier,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub parents: Vec<EntityIdentifier>,
}

impl EntityItem {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesDefinition {
    pub entity_list: Vec<EntityItem>,
}

/// Maps graph vertices onto namespaced entity identifiers.
#[derive(Debug, Clone)]
pub struct EntityContextBuilder {
    namespace: String,
    application_id: String,
}

impl EntityContextBuilder {
    pub fn new(namespace: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            application_id: application_id.into(),
        }
    }

    pub fn from_config(config: &AuthzConfig) -> Self {
        Self::new(config.app_namespace.clone(), config.application_id.clone())
    }

    pub fn entity(&self, entity_type: &str, entity_id: impl Into<String>) -> EntityIdentifier {
        EntityIdentifier {
            entity_type: format!("{}::{}", self.namespace, entity_type),
            entity_id: entity_id.into(),
        }
    }

    pub fn vertex_entity(&self, vertex: &VertexRef) -> EntityIdentifier {
        self.entity(vertex.kind.entity_type(), vertex.id.clone())
    }

    /// Placeholder resource used when a check carries no resource.
    pub fn application_entity(&self) -> EntityIdentifier {
        self.entity("Application", self.application_id.clone())
    }

    pub fn action(&self, action: Action) -> ActionIdentifier {
        self.action_named(action.id())
    }

    pub fn action_named(&self, action_id: &str) -> ActionIdentifier {
        ActionIdentifier {
            action_type: format!("{}::Action", self.namespace),
            action_id: action_id.to_string(),
        }
    }

    /// Entity context for a resolved resource.
    ///
    /// Owners become a set of user references, the ancestor chain
    /// becomes the `parents` relation so the engine can evaluate
    /// `resource in Directory::"..."` transitively.
    pub fn build(&self, hierarchy: &ResolvedHierarchy) -> PetVideosResult<EntityItem> {
        if !hierarchy.resource.kind.is_resource() {
            return Err(PetVideosError::InvalidRequestShape(format!(
                "{} is not a resource",
                hierarchy.resource.id
            )));
        }
        if let Some(bad) = hierarchy.owners.iter().find(|o| o.kind != VertexKind::User) {
            return Err(PetVideosError::InvalidRequestShape(format!(
                "owner {} is a {}, not a user",
                bad.id, bad.kind
            )));
        }
        if let Some(bad) = hierarchy
            .ancestors
            .iter()
            .find(|a| a.kind != VertexKind::Directory)
        {
            return Err(PetVideosError::InvalidRequestShape(format!(
                "ancestor {} is a {}, not a directory",
                bad.id, bad.kind
            )));
        }

        let owners = AttributeValue::entity_set(hierarchy.owners.iter().map(|o| self.vertex_entity(o)));
        let attributes = BTreeMap::from([
            (OWNER_ATTRIBUTE.to_string(), owners),
            (
                IS_PUBLIC_ATTRIBUTE.to_string(),
                AttributeValue::Boolean(hierarchy.is_public),
            ),
        ]);

        Ok(EntityItem {
            identifier: self.vertex_entity(&hierarchy.resource),
            attributes,
            parents: hierarchy
                .ancestors
                .iter()
                .map(|a| self.vertex_entity(a))
                .collect(),
        })
    }
}
