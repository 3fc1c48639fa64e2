//! Minimal top-level change sets between a submitted payload and the persisted
//! entity, recorded for edit history and undo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Changed top-level keys, in the order they appear in the payload.
    pub field_changes: Vec<String>,
    pub before: Map<String, Value>,
    pub after: Map<String, Value>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.field_changes.is_empty()
    }
}

/// Compare `dto` against `original` key by key. A null in `dto` means "no
/// change requested" and is skipped. Changed fields are recorded whole, not as
/// nested sub-diffs.
pub fn pick_changes(dto: &Value, original: &Value) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let Some(dto) = dto.as_object() else {
        return changes;
    };
    let empty = Map::new();
    let original = original.as_object().unwrap_or(&empty);

    for (key, next) in dto {
        if next.is_null() {
            continue;
        }
        let prev = original.get(key).unwrap_or(&Value::Null);
        if values_equal(next, prev) {
            continue;
        }
        changes.field_changes.push(key.clone());
        changes.before.insert(key.clone(), prev.clone());
        changes.after.insert(key.clone(), next.clone());
    }

    changes
}

fn values_equal(next: &Value, prev: &Value) -> bool {
    match (next, prev) {
        (Value::String(a), Value::String(b)) => a == b || same_instant(a, b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => next == prev,
    }
}

/// Structural equality below the top level: arrays by position, objects by key.
fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        _ => values_equal(a, b),
    }
}

fn same_instant(a: &str, b: &str) -> bool {
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Full RFC 3339 timestamps only, the form a stored date serializes to. Bare
/// dates and other date-like text compare verbatim.
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
