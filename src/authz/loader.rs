use std::collections::{HashMap, HashSet};

use crate::authz::errors::AuthzError;
use crate::bitmask::Bitmask;
use crate::registry::{self, PermissionEntity};
use crate::settings::Grants;

/// Allow-masks per (role, entity), compiled once from configured group grants.
/// Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    masks: HashMap<(String, PermissionEntity), Bitmask>,
    admins: HashSet<String>,
}

impl GrantTable {
    pub fn mask_for(&self, role: &str, entity: PermissionEntity) -> Bitmask {
        if self.admins.contains(role) {
            return registry::full_mask(entity);
        }
        self.masks
            .get(&(role.to_string(), entity))
            .copied()
            .unwrap_or_default()
    }

    pub fn role_count(&self) -> usize {
        self.masks
            .keys()
            .map(|(role, _)| role.as_str())
            .chain(self.admins.iter().map(String::as_str))
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Compile `role -> entity -> [group]` grants into masks. Unlike
/// `fields_of_group`, unknown entities and groups are rejected here so a typo
/// in configuration does not silently grant nothing.
pub fn compile_grants(grants: &Grants, admins: &[String]) -> Result<GrantTable, AuthzError> {
    let mut masks = HashMap::new();

    for (role, by_entity) in grants {
        for (entity_name, groups) in by_entity {
            let entity: PermissionEntity = entity_name.parse().map_err(|_| {
                AuthzError::InvalidGrant(format!(
                    "role `{role}` grants unknown entity `{entity_name}`"
                ))
            })?;

            for group in groups {
                if registry::fields_of_group(entity, group).is_empty() {
                    return Err(AuthzError::InvalidGrant(format!(
                        "role `{role}` grants unknown group `{group}` on {entity}"
                    )));
                }
            }

            let mask = registry::group_mask(entity, groups);
            masks
                .entry((role.clone(), entity))
                .and_modify(|m: &mut Bitmask| *m = m.union(mask))
                .or_insert(mask);
        }
    }

    let table = GrantTable {
        masks,
        admins: admins.iter().cloned().collect(),
    };

    tracing::info!(
        roles = table.role_count(),
        admins = table.admins.len(),
        "Compiled permission grants"
    );

    Ok(table)
}
