use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::authz::errors::AuthzError;
use crate::authz::resolver::PermissionResolver;
use crate::authz::types::{Actor, AuthorizationPolicy, BitsSelector, Decision};
use crate::bitmask::has_bit;
use crate::registry::PermissionEntity;

/// Decide whether `actor` may submit `body` under `policy`.
///
/// The resolver is consulted only when the body touches at least one bit, and
/// then exactly once.
pub async fn decide(
    policy: &AuthorizationPolicy,
    resolver: &dyn PermissionResolver,
    actor: &Actor,
    body: &Value,
) -> Result<Decision, AuthzError> {
    // 1. Which bits does this request touch?
    let required = policy.required_bits(body);
    if required.is_empty() {
        tracing::debug!(actor = actor.id, entity = %policy.entity, "No gated fields in request");
        return Ok(Decision::Allow);
    }

    // 2. Fresh mask for this actor
    let allow_mask = resolver
        .allow_mask_for(actor.id, &actor.role, policy.entity)
        .await?;

    // 3. Compare
    let denied_bits: Vec<u32> = required
        .iter()
        .copied()
        .filter(|b| !has_bit(allow_mask, *b))
        .collect();
    if denied_bits.is_empty() {
        tracing::debug!(
            actor = actor.id,
            entity = %policy.entity,
            required = ?required,
            "Edit allowed"
        );
        return Ok(Decision::Allow);
    }

    let denied_fields = policy.denied_fields(&denied_bits);
    tracing::info!(
        actor = actor.id,
        role = %actor.role,
        entity = %policy.entity,
        denied_bits = ?denied_bits,
        %denied_fields,
        "Edit denied"
    );
    Ok(Decision::Deny {
        denied_bits,
        denied_fields,
    })
}

/// Like [`decide`], with a denial surfaced as [`AuthzError::PermissionDenied`].
pub async fn authorize(
    policy: &AuthorizationPolicy,
    resolver: &dyn PermissionResolver,
    actor: &Actor,
    body: &Value,
) -> Result<(), AuthzError> {
    match decide(policy, resolver, actor, body).await? {
        Decision::Allow => Ok(()),
        Decision::Deny {
            denied_bits,
            denied_fields,
        } => Err(AuthzError::PermissionDenied {
            denied_bits,
            denied_fields,
        }),
    }
}

/// A policy bound to a resolver, ready to plug into a request guard.
#[derive(Clone)]
pub struct Authorizer {
    policy: AuthorizationPolicy,
    resolver: Arc<dyn PermissionResolver>,
}

impl Authorizer {
    pub fn new(policy: AuthorizationPolicy, resolver: Arc<dyn PermissionResolver>) -> Self {
        Self { policy, resolver }
    }

    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    pub async fn authorize(&self, actor: &Actor, body: &Value) -> Result<(), AuthzError> {
        authorize(&self.policy, self.resolver.as_ref(), actor, body).await
    }

    pub async fn decide(&self, actor: &Actor, body: &Value) -> Result<Decision, AuthzError> {
        decide(&self.policy, self.resolver.as_ref(), actor, body).await
    }
}

pub fn build_authorizer(
    entity: PermissionEntity,
    selector: BitsSelector,
    field_key_map: Option<BTreeMap<u32, String>>,
    relation_key_name: Option<String>,
    resolver: Arc<dyn PermissionResolver>,
) -> Authorizer {
    let policy = AuthorizationPolicy {
        entity,
        selector,
        field_key_map,
        relation_key_name,
    };
    Authorizer::new(policy, resolver)
}
