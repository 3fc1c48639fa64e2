//! Identity extraction for relation-array changes (developers, characters,
//! links, covers, ...). Ids feed cache invalidation; keys let the history and
//! undo layers match the same element across concurrent edits.
//!
//! Nothing here returns an error: these run after the write has been
//! committed, so malformed input degrades to an empty result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const LINK_RELATIONS: &[&str] = &["links", "extlinks", "websites"];
const COVER_RELATIONS: &[&str] = &["covers"];

/// Four-way view of a relation field edit. Pools that were not arrays in the
/// source record are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RelationChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<Vec<Value>>,
}

impl RelationChange {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            ..Default::default()
        }
    }

    pub fn with_before(mut self, elements: Vec<Value>) -> Self {
        self.before = Some(elements);
        self
    }

    pub fn with_after(mut self, elements: Vec<Value>) -> Self {
        self.after = Some(elements);
        self
    }

    pub fn with_added(mut self, elements: Vec<Value>) -> Self {
        self.added = Some(elements);
        self
    }

    pub fn with_removed(mut self, elements: Vec<Value>) -> Self {
        self.removed = Some(elements);
        self
    }

    /// Lenient conversion from any JSON record.
    pub fn from_value(value: &Value) -> Self {
        let pool = |name: &str| value.get(name).and_then(Value::as_array).cloned();
        Self {
            relation: value
                .get("relation")
                .and_then(Value::as_str)
                .map(str::to_string),
            before: pool("before"),
            after: pool("after"),
            added: pool("added"),
            removed: pool("removed"),
        }
    }

    /// True when no pool is an array, i.e. a plain scalar change.
    pub fn is_scalar(&self) -> bool {
        self.before.is_none() && self.after.is_none() && self.added.is_none() && self.removed.is_none()
    }

    fn pools(&self) -> impl Iterator<Item = &Value> {
        [&self.before, &self.after, &self.added, &self.removed]
            .into_iter()
            .flatten()
            .flatten()
    }
}

impl From<Value> for RelationChange {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// Sink for the extraction diagnostic. Implementations must not panic.
pub trait RelationLog: Send + Sync {
    fn ids_extracted(&self, relation: Option<&str>, ids: &[i64]);
}

/// Emits the diagnostic as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl RelationLog for TracingLog {
    fn ids_extracted(&self, relation: Option<&str>, ids: &[i64]) {
        tracing::debug!(
            relation = relation.unwrap_or("-"),
            count = ids.len(),
            ?ids,
            "Extracted relation ids"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationIdExtractor<L = TracingLog> {
    log: L,
}

impl<L: RelationLog> RelationIdExtractor<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }

    /// Numeric ids referenced anywhere in the change, pools visited in
    /// before, after, added, removed order, first occurrence kept.
    pub fn extract(&self, change: Option<&RelationChange>) -> Vec<i64> {
        let Some(change) = change else {
            return Vec::new();
        };
        if change.is_scalar() {
            return Vec::new();
        }

        let mut ids = Vec::new();
        for element in change.pools() {
            if let Some(id) = element.get("id").and_then(numeric_id) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        self.log.ids_extracted(change.relation.as_deref(), &ids);
        ids
    }
}

pub fn extract_relation_id(change: Option<&RelationChange>) -> Vec<i64> {
    RelationIdExtractor::new(TracingLog).extract(change)
}

/// Stable identity keys for the elements of the `before` and `after`
/// snapshots, first occurrence kept.
pub fn extract_relation_key(change: &RelationChange) -> Vec<String> {
    let relation = change.relation.as_deref();
    let mut keys: Vec<String> = Vec::new();
    let elements = [&change.before, &change.after]
        .into_iter()
        .flatten()
        .flatten();
    for element in elements {
        let key = relation_key(relation, element);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Key for one element: `id:`, `link:`, `cover:` or the compact JSON of the
/// element itself. The link and cover forms need the element to carry the
/// identifying fields; the relation name only relaxes which of them suffice.
pub fn relation_key(relation: Option<&str>, element: &Value) -> String {
    if let Some(id) = element.get("id").filter(|v| is_truthy(v)) {
        return match (id, numeric_id(id)) {
            (Value::Number(_), Some(n)) => format!("id:{n}"),
            _ => format!("id:{}", slot(Some(id))),
        };
    }

    if let Some(obj) = element.as_object() {
        let named = |set: &[&str]| relation.is_some_and(|r| set.contains(&r));
        let has_url = obj.contains_key("url");
        if has_url && (named(LINK_RELATIONS) || obj.contains_key("label") || obj.contains_key("name")) {
            return format!(
                "link:{}|{}|{}",
                slot(obj.get("url")),
                slot(obj.get("label")),
                slot(obj.get("name"))
            );
        }
        let has_dims = obj.contains_key("dims");
        if (has_url && named(COVER_RELATIONS)) || (has_dims && (has_url || obj.contains_key("type"))) {
            let dims = match obj.get("dims") {
                Some(Value::Null) | None => String::new(),
                Some(dims) => compact(dims),
            };
            return format!(
                "cover:{}|{}|{}",
                slot(obj.get("url")),
                slot(obj.get("type")),
                dims
            );
        }
    }

    compact(element)
}

/// Integer id from a JSON number or numeric string; integral floats such as
/// `7.0` or `"12.0"` are accepted.
fn numeric_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Bare text for strings, empty for missing or null, compact JSON otherwise.
fn slot(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => compact(other),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLog {
        calls: Mutex<Vec<(Option<String>, Vec<i64>)>>,
    }

    impl RelationLog for RecordingLog {
        fn ids_extracted(&self, relation: Option<&str>, ids: &[i64]) {
            self.calls
                .lock()
                .unwrap()
                .push((relation.map(str::to_string), ids.to_vec()));
        }
    }

    fn change(value: Value) -> RelationChange {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_id_none() {
        assert!(extract_relation_id(None).is_empty());
    }

    #[test]
    fn test_extract_id_order_and_dedup() {
        let c = change(json!({
            "before": [{ "id": 1 }, { "id": 2 }],
            "after": [{ "id": 2 }, { "id": 3 }],
            "added": [{ "id": 4 }],
            "removed": [{ "id": 1 }, { "id": "bad" }],
        }));
        assert_eq!(extract_relation_id(Some(&c)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_extract_id_accepts_numeric_strings_and_integral_floats() {
        let c = change(json!({
            "relation": "developers",
            "after": [{ "id": "12" }, { "id": 7.0 }, { "id": 7.5 }, { "id": "8.0" }, { "id": "8.5" }, { "name": "no id" }, 5, null],
        }));
        assert_eq!(extract_relation_id(Some(&c)), vec![12, 7, 8]);
    }

    #[test]
    fn test_extract_id_scalar_change_is_empty() {
        let c = change(json!({ "relation": "title_en", "before": "a", "after": "b" }));
        assert!(c.is_scalar());
        assert!(extract_relation_id(Some(&c)).is_empty());
    }

    #[test]
    fn test_extract_id_logs_through_injected_logger() {
        let log = RecordingLog::default();
        let extractor = RelationIdExtractor::new(log);
        let c = RelationChange::new("characters").with_added(vec![json!({ "id": 9 })]);
        assert_eq!(extractor.extract(Some(&c)), vec![9]);
        assert!(extractor.extract(None).is_empty());

        let calls = extractor.log.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (Some("characters".to_string()), vec![9]));
    }

    #[test]
    fn test_extract_key_dedups_across_snapshots() {
        let c = change(json!({
            "relation": "characters",
            "before": [{ "id": 1 }, { "id": 2 }],
            "after": [{ "id": 2 }],
        }));
        assert_eq!(extract_relation_key(&c), vec!["id:1", "id:2"]);
    }

    #[test]
    fn test_extract_key_fallback_json() {
        let c = change(json!({
            "relation": "images",
            "before": [{ "path": "/a.png" }, { "path": "/a.png" }],
        }));
        assert_eq!(extract_relation_key(&c), vec![r#"{"path":"/a.png"}"#]);
    }

    #[test]
    fn test_extract_key_ignores_added_and_removed() {
        let c = RelationChange::new("tags")
            .with_added(vec![json!({ "id": 5 })])
            .with_removed(vec![json!({ "id": 6 })]);
        assert!(extract_relation_key(&c).is_empty());
    }

    #[test]
    fn test_link_keys() {
        let c = change(json!({
            "relation": "links",
            "before": [{ "url": "https://a.jp", "label": "Official", "name": "a" }],
            "after": [{ "url": "https://b.jp", "label": "Store" }, { "url": "https://a.jp", "label": "Official", "name": "a" }],
        }));
        assert_eq!(
            extract_relation_key(&c),
            vec!["link:https://a.jp|Official|a", "link:https://b.jp|Store|"]
        );
    }

    #[test]
    fn test_link_shape_detected_without_relation_name() {
        let key = relation_key(None, &json!({ "url": "https://x", "name": "x" }));
        assert_eq!(key, "link:https://x||x");
    }

    #[test]
    fn test_cover_keys() {
        let c = change(json!({
            "relation": "covers",
            "after": [
                { "url": "/c/1.webp", "type": "main", "dims": { "w": 600, "h": 800 } },
                { "url": "/c/1.webp", "type": "main", "dims": { "w": 300, "h": 400 } },
            ],
        }));
        assert_eq!(
            extract_relation_key(&c),
            vec![
                r#"cover:/c/1.webp|main|{"w":600,"h":800}"#,
                r#"cover:/c/1.webp|main|{"w":300,"h":400}"#,
            ]
        );
    }

    #[test]
    fn test_id_takes_precedence_over_shape() {
        let key = relation_key(Some("links"), &json!({ "id": 3, "url": "https://x", "label": "x" }));
        assert_eq!(key, "id:3");
        let key = relation_key(Some("characters"), &json!({ "id": "c-9" }));
        assert_eq!(key, "id:c-9");
    }

    #[test]
    fn test_integral_float_id_key_matches_extracted_id() {
        assert_eq!(relation_key(None, &json!({ "id": 7.0 })), "id:7");
        assert_eq!(relation_key(None, &json!({ "id": 7 })), "id:7");
        assert_eq!(relation_key(None, &json!({ "id": 7.5 })), "id:7.5");
        let c = change(json!({ "before": [{ "id": 7 }], "after": [{ "id": 7.0 }] }));
        assert_eq!(extract_relation_key(&c), vec!["id:7"]);
    }

    #[test]
    fn test_named_relation_without_shape_fields_keys_whole_element() {
        let links = change(json!({
            "relation": "links",
            "before": [{ "site": "a" }, { "site": "b" }],
        }));
        assert_eq!(
            extract_relation_key(&links),
            vec![r#"{"site":"a"}"#, r#"{"site":"b"}"#]
        );

        let covers = change(json!({
            "relation": "covers",
            "after": [{ "path": "/1.png" }, { "path": "/2.png" }],
        }));
        assert_eq!(
            extract_relation_key(&covers),
            vec![r#"{"path":"/1.png"}"#, r#"{"path":"/2.png"}"#]
        );
    }

    #[test]
    fn test_named_relation_relaxes_required_fields() {
        assert_eq!(
            relation_key(Some("websites"), &json!({ "url": "https://x" })),
            "link:https://x||"
        );
        assert_eq!(
            relation_key(Some("covers"), &json!({ "url": "/c.webp" })),
            "cover:/c.webp||"
        );
        assert_eq!(
            relation_key(Some("images"), &json!({ "url": "/c.webp" })),
            r#"{"url":"/c.webp"}"#
        );
    }

    #[test]
    fn test_falsy_id_falls_through() {
        assert_eq!(relation_key(None, &json!({ "id": 0, "role": "main" })), r#"{"id":0,"role":"main"}"#);
        assert_eq!(relation_key(None, &json!({ "id": "" })), r#"{"id":""}"#);
    }

    #[test]
    fn test_lenient_deserialization() {
        let c = change(json!({ "relation": 5, "before": { "id": 1 }, "after": [{ "id": 1 }] }));
        assert_eq!(c.relation, None);
        assert_eq!(c.before, None);
        assert_eq!(c.after, Some(vec![json!({ "id": 1 })]));
        let c = change(json!("garbage"));
        assert!(c.is_scalar());
    }
}
