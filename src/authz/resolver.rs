use std::collections::HashMap;

use async_trait::async_trait;

use crate::authz::errors::AuthzError;
use crate::authz::loader::GrantTable;
use crate::bitmask::Bitmask;
use crate::registry::PermissionEntity;

/// Source of allow-masks. Called once per authorization attempt and never
/// cached here; retries belong to the implementation's own transport.
///
/// An empty mask means nothing is editable.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    async fn allow_mask_for(
        &self,
        actor_id: u64,
        actor_role: &str,
        entity: PermissionEntity,
    ) -> Result<Bitmask, AuthzError>;
}

/// Fixed per-actor masks, keyed by actor id and entity.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    masks: HashMap<(u64, PermissionEntity), Bitmask>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(mut self, actor_id: u64, entity: PermissionEntity, mask: Bitmask) -> Self {
        self.masks.insert((actor_id, entity), mask);
        self
    }
}

#[async_trait]
impl PermissionResolver for StaticResolver {
    async fn allow_mask_for(
        &self,
        actor_id: u64,
        _actor_role: &str,
        entity: PermissionEntity,
    ) -> Result<Bitmask, AuthzError> {
        Ok(self
            .masks
            .get(&(actor_id, entity))
            .copied()
            .unwrap_or_default())
    }
}

/// Role-based masks compiled from configured group grants.
#[derive(Debug, Clone)]
pub struct GroupGrantResolver {
    table: GrantTable,
}

impl GroupGrantResolver {
    pub fn new(table: GrantTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl PermissionResolver for GroupGrantResolver {
    async fn allow_mask_for(
        &self,
        actor_id: u64,
        actor_role: &str,
        entity: PermissionEntity,
    ) -> Result<Bitmask, AuthzError> {
        let mask = self.table.mask_for(actor_role, entity);
        tracing::debug!(actor_id, role = actor_role, %entity, %mask, "Resolved allow mask");
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmask::mask;
    use crate::settings::Grants;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new().with_mask(7, PermissionEntity::Game, mask([1, 3]));
        assert_eq!(
            resolver.allow_mask_for(7, "editor", PermissionEntity::Game).await.unwrap(),
            mask([1, 3])
        );
        assert!(resolver
            .allow_mask_for(7, "editor", PermissionEntity::Developer)
            .await
            .unwrap()
            .is_empty());
        assert!(resolver
            .allow_mask_for(8, "editor", PermissionEntity::Game)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_group_grant_resolver() {
        let mut grants = Grants::new();
        grants.insert(
            "editor".into(),
            HashMap::from([("game".to_string(), vec!["DATES".to_string()])]),
        );
        let table = crate::authz::loader::compile_grants(&grants, &[]).unwrap();
        let resolver = GroupGrantResolver::new(table);

        let m = resolver
            .allow_mask_for(1, "editor", PermissionEntity::Game)
            .await
            .unwrap();
        assert_eq!(m, mask([12, 13]));
        assert!(resolver
            .allow_mask_for(1, "guest", PermissionEntity::Game)
            .await
            .unwrap()
            .is_empty());
    }
}
