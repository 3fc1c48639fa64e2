use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::bitmask::{self, Bitmask};
use crate::registry::{self, PermissionEntity};

/// Total field -> editable map for one entity, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMap {
    entity: PermissionEntity,
    entries: Vec<(&'static str, bool)>,
}

impl PermissionMap {
    pub fn entity(&self) -> PermissionEntity {
        self.entity
    }

    /// `None` only for a name that is not a canonical field of the entity.
    pub fn get(&self, field: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, allowed)| *allowed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn editable(&self) -> Vec<&'static str> {
        self.iter()
            .filter(|(_, allowed)| *allowed)
            .map(|(name, _)| name)
            .collect()
    }

    /// The allow-mask equivalent of this map.
    pub fn to_mask(&self) -> Bitmask {
        bitmask::mask(
            self.entries
                .iter()
                .enumerate()
                .filter(|(_, (_, allowed))| *allowed)
                .map(|(i, _)| i as u32),
        )
    }
}

impl Serialize for PermissionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, allowed) in &self.entries {
            map.serialize_entry(name, allowed)?;
        }
        map.end()
    }
}

/// Expand a sparse group -> enabled map into a total field map. Only enabled
/// groups are applied, so a field is never switched back off; unknown keys are
/// ignored.
pub fn build_permission_map<I, K>(group_enablement: I, entity: PermissionEntity) -> PermissionMap
where
    I: IntoIterator<Item = (K, bool)>,
    K: AsRef<str>,
{
    let mut entries: Vec<(&'static str, bool)> = registry::all_fields(entity)
        .iter()
        .map(|f| (*f, false))
        .collect();

    for (group, enabled) in group_enablement {
        if !enabled {
            continue;
        }
        for field in registry::fields_of_group(entity, group.as_ref()) {
            if let Some(entry) = entries.iter_mut().find(|(name, _)| name == field) {
                entry.1 = true;
            }
        }
    }

    PermissionMap { entity, entries }
}

/// Union of the fields of every enabled group, first-seen order.
pub fn get_editable_fields<I, K>(group_enablement: I, entity: PermissionEntity) -> Vec<&'static str>
where
    I: IntoIterator<Item = (K, bool)>,
    K: AsRef<str>,
{
    let mut fields: Vec<&'static str> = Vec::new();
    for (group, enabled) in group_enablement {
        if !enabled {
            continue;
        }
        for field in registry::fields_of_group(entity, group.as_ref()) {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
    }
    fields
}
