use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::authz::errors::AuthzError;
use crate::registry::{self, PermissionEntity};

/// The caller attempting the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub role: String,
}

impl Actor {
    pub fn new(id: u64, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }
}

pub type SelectorFn = Arc<dyn Fn(&Value) -> Vec<u32> + Send + Sync>;

/// Derives the bit indices a request body touches.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BitsSelector {
    /// One bit per top-level body key that is a canonical field of the entity.
    PresentFields,
    /// Every field of the named groups.
    Groups(Vec<String>),
    Fixed(Vec<u32>),
    #[serde(skip)]
    Custom(SelectorFn),
}

impl BitsSelector {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Vec<u32> + Send + Sync + 'static,
    {
        BitsSelector::Custom(Arc::new(f))
    }

    pub fn select(&self, entity: PermissionEntity, body: &Value) -> Vec<u32> {
        match self {
            BitsSelector::PresentFields => body
                .as_object()
                .map(|obj| {
                    obj.keys()
                        .filter_map(|k| registry::bit_index_of(entity, k))
                        .collect()
                })
                .unwrap_or_default(),
            BitsSelector::Groups(keys) => registry::group_bits(entity, keys),
            BitsSelector::Fixed(bits) => bits.clone(),
            BitsSelector::Custom(f) => f(body),
        }
    }
}

impl fmt::Debug for BitsSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitsSelector::PresentFields => f.write_str("PresentFields"),
            BitsSelector::Groups(keys) => f.debug_tuple("Groups").field(keys).finish(),
            BitsSelector::Fixed(bits) => f.debug_tuple("Fixed").field(bits).finish(),
            BitsSelector::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Everything needed to authorize one kind of write endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    pub entity: PermissionEntity,
    pub selector: BitsSelector,
    /// bit -> field name, for per-field denial reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_key_map: Option<BTreeMap<u32, String>>,
    /// Reported as a single unit when the bits belong to one relation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_key_name: Option<String>,
}

impl AuthorizationPolicy {
    pub fn new(entity: PermissionEntity, selector: BitsSelector) -> Self {
        Self {
            entity,
            selector,
            field_key_map: None,
            relation_key_name: None,
        }
    }

    pub fn with_field_key_map(mut self, map: BTreeMap<u32, String>) -> Self {
        self.field_key_map = Some(map);
        self
    }

    pub fn with_relation_key_name(mut self, name: impl Into<String>) -> Self {
        self.relation_key_name = Some(name.into());
        self
    }

    /// Scalar edit endpoint: every canonical key in the body, denials named per field.
    pub fn for_fields(entity: PermissionEntity) -> Self {
        let map = registry::all_fields(entity)
            .iter()
            .enumerate()
            .map(|(i, f)| (i as u32, f.to_string()))
            .collect();
        Self::new(entity, BitsSelector::PresentFields).with_field_key_map(map)
    }

    /// Relation-only endpoint: the relation's bit, denied as one unit.
    pub fn for_relation(entity: PermissionEntity, relation: &str) -> Result<Self, AuthzError> {
        let bit = registry::bit_index_of(entity, relation).ok_or_else(|| {
            AuthzError::InvalidPolicy(format!("`{relation}` is not a field of {entity}"))
        })?;
        Ok(Self::new(entity, BitsSelector::Fixed(vec![bit])).with_relation_key_name(relation))
    }

    pub fn required_bits(&self, body: &Value) -> Vec<u32> {
        self.selector.select(self.entity, body)
    }

    /// Names for denied bits, in the shape this policy reports them.
    pub fn denied_fields(&self, denied_bits: &[u32]) -> DeniedFields {
        if let Some(map) = &self.field_key_map {
            let names = denied_bits
                .iter()
                .map(|b| match map.get(b) {
                    Some(name) => name.clone(),
                    None => registry::field_at(self.entity, *b)
                        .map(str::to_string)
                        .unwrap_or_else(|| b.to_string()),
                })
                .collect();
            DeniedFields::Fields(names)
        } else if let Some(relation) = &self.relation_key_name {
            DeniedFields::Relation(relation.clone())
        } else {
            DeniedFields::Bits(denied_bits.to_vec())
        }
    }
}

/// Denial payload: a list of field names, a single relation name, or the raw
/// bits when nothing better is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeniedFields {
    Fields(Vec<String>),
    Relation(String),
    Bits(Vec<u32>),
}

impl fmt::Display for DeniedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeniedFields::Fields(names) => write!(f, "fields [{}]", names.join(", ")),
            DeniedFields::Relation(name) => write!(f, "relation `{name}`"),
            DeniedFields::Bits(bits) => {
                let bits: Vec<String> = bits.iter().map(u32::to_string).collect();
                write!(f, "bits [{}]", bits.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    #[serde(rename_all = "camelCase")]
    Deny {
        denied_bits: Vec<u32>,
        denied_fields: DeniedFields,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub actor: Actor,
    pub policy: AuthorizationPolicy,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangesRequest {
    pub dto: Value,
    #[serde(default)]
    pub original: Value,
}

#[derive(Debug, Deserialize)]
pub struct RelationRequest {
    #[serde(default)]
    pub change: Option<crate::relation::RelationChange>,
}

#[derive(Debug, Serialize)]
pub struct RelationIdsResponse {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct RelationKeysResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub bit: u32,
}

#[derive(Debug, Deserialize)]
pub struct PermissionMapRequest {
    #[serde(default)]
    pub groups: BTreeMap<String, bool>,
}
