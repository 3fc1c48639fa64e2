//! Per-entity field registry: canonical field names, their bit indices, and the
//! coarse permission groups that cover them.

pub mod tables;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bitmask::{self, Bitmask};
use crate::errors::FieldgateError;
use tables::GroupTable;

/// Entity kinds whose fields are permission-gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionEntity {
    Game,
    Developer,
    Character,
}

impl PermissionEntity {
    pub const ALL: [PermissionEntity; 3] = [
        PermissionEntity::Game,
        PermissionEntity::Developer,
        PermissionEntity::Character,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionEntity::Game => "game",
            PermissionEntity::Developer => "developer",
            PermissionEntity::Character => "character",
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            PermissionEntity::Game => tables::GAME_FIELDS,
            PermissionEntity::Developer => tables::DEVELOPER_FIELDS,
            PermissionEntity::Character => tables::CHARACTER_FIELDS,
        }
    }

    fn group_table(self) -> GroupTable {
        match self {
            PermissionEntity::Game => tables::GAME_GROUPS,
            PermissionEntity::Developer => tables::DEVELOPER_GROUPS,
            PermissionEntity::Character => tables::CHARACTER_GROUPS,
        }
    }
}

impl fmt::Display for PermissionEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionEntity {
    type Err = FieldgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionEntity::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| FieldgateError::UnknownEntity(s.to_string()))
    }
}

/// Every canonical field of `entity`, in bit-index order.
pub fn all_fields(entity: PermissionEntity) -> &'static [&'static str] {
    entity.fields()
}

/// Fields covered by `group_key`; empty for an unknown key.
pub fn fields_of_group(entity: PermissionEntity, group_key: &str) -> &'static [&'static str] {
    entity
        .group_table()
        .iter()
        .find(|(key, _)| *key == group_key)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

pub fn groups(entity: PermissionEntity) -> GroupTable {
    entity.group_table()
}

pub fn bit_index_of(entity: PermissionEntity, field: &str) -> Option<u32> {
    entity
        .fields()
        .iter()
        .position(|f| *f == field)
        .map(|i| i as u32)
}

pub fn field_at(entity: PermissionEntity, bit: u32) -> Option<&'static str> {
    entity.fields().get(bit as usize).copied()
}

/// Bits of every field covered by the named groups. Unknown keys contribute nothing.
pub fn group_bits<S: AsRef<str>>(entity: PermissionEntity, group_keys: &[S]) -> Vec<u32> {
    let mut bits = Vec::new();
    for key in group_keys {
        for field in fields_of_group(entity, key.as_ref()) {
            if let Some(bit) = bit_index_of(entity, field) {
                if !bits.contains(&bit) {
                    bits.push(bit);
                }
            }
        }
    }
    bits
}

pub fn group_mask<S: AsRef<str>>(entity: PermissionEntity, group_keys: &[S]) -> Bitmask {
    bitmask::mask(group_bits(entity, group_keys))
}

/// Mask covering every canonical field of `entity`.
pub fn full_mask(entity: PermissionEntity) -> Bitmask {
    Bitmask::all(entity.fields().len())
}

/// Check the static tables: unique field names, group members that exist,
/// and tables that fit the mask width.
pub fn validate() -> Result<(), FieldgateError> {
    for entity in PermissionEntity::ALL {
        let fields = entity.fields();
        if fields.len() > Bitmask::BITS as usize {
            return Err(FieldgateError::Registry(format!(
                "{entity} has {} fields but masks hold {}",
                fields.len(),
                Bitmask::BITS
            )));
        }

        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(*field) {
                return Err(FieldgateError::Registry(format!(
                    "duplicate field `{field}` on {entity}"
                )));
            }
        }

        let mut group_keys = HashSet::new();
        for (key, members) in entity.group_table() {
            if !group_keys.insert(*key) {
                return Err(FieldgateError::Registry(format!(
                    "duplicate group `{key}` on {entity}"
                )));
            }
            for member in *members {
                if !seen.contains(member) {
                    return Err(FieldgateError::Registry(format!(
                        "group `{key}` on {entity} references unknown field `{member}`"
                    )));
                }
            }
        }

        if !group_keys.contains("IDS") {
            return Err(FieldgateError::Registry(format!(
                "{entity} has no `IDS` group"
            )));
        }
    }

    tracing::debug!("Field registry validated");
    Ok(())
}
