//! Document model shared by every store backend
//!
//! Records travel to the store as JSON objects carrying their identifier in
//! `id`. Filters select documents; an [`Update`] is a list of per-field
//! operations that a backend applies to one document at a time, so each
//! document changes atomically even when a filter matches several.

use crate::toggle::{difference, toggle, union};
use airfleet_types::RecordId;
use serde_json::{Map, Value};

pub type Document = Value;

/// Field holding the record identifier
pub const ID_FIELD: &str = "id";

/// Selects documents in a collection
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(RecordId),
    /// Field at `path` equals `value`, or is an array containing it
    Eq { path: String, value: Value },
}

impl Filter {
    pub fn by_id(id: RecordId) -> Self {
        Filter::Id(id)
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => document_id(doc) == Some(*id),
            Filter::Eq { path, value } => match get_path(doc, path) {
                Some(Value::Array(items)) if items.contains(value) => true,
                Some(found) => found == value,
                None => false,
            },
        }
    }
}

/// A single field change
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Replace unless the new value is null or an empty string
    SetIfPresent(Value),
    Set(Value),
    /// Set to the value, or clear to null when the field already holds it
    Flip(Value),
    /// Membership toggle against the field's current array
    Toggle(Vec<Value>),
    /// Drop every listed value from the field's current array
    Remove(Vec<Value>),
    /// Append every listed value the field's current array lacks
    Add(Vec<Value>),
}

impl FieldOp {
    /// Values this operation may leave in the field
    pub fn written_values(&self) -> Vec<&Value> {
        match self {
            FieldOp::SetIfPresent(v) | FieldOp::Set(v) | FieldOp::Flip(v) => vec![v],
            FieldOp::Toggle(vs) | FieldOp::Remove(vs) | FieldOp::Add(vs) => vs.iter().collect(),
        }
    }
}

/// Ordered field operations applied to one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(String, FieldOp)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, path: impl Into<String>, op: FieldOp) -> Self {
        self.ops.push((path.into(), op));
        self
    }

    pub fn set_if_present(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, FieldOp::SetIfPresent(value.into()))
    }

    pub fn set(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, FieldOp::Set(value.into()))
    }

    pub fn flip(self, path: impl Into<String>, id: RecordId) -> Self {
        self.op(path, FieldOp::Flip(id_value(id)))
    }

    pub fn toggle_ids(self, path: impl Into<String>, ids: &[RecordId]) -> Self {
        self.op(path, FieldOp::Toggle(ids.iter().copied().map(id_value).collect()))
    }

    pub fn remove_ids(self, path: impl Into<String>, ids: &[RecordId]) -> Self {
        self.op(path, FieldOp::Remove(ids.iter().copied().map(id_value).collect()))
    }

    pub fn add_ids(self, path: impl Into<String>, ids: &[RecordId]) -> Self {
        self.op(path, FieldOp::Add(ids.iter().copied().map(id_value).collect()))
    }

    pub fn toggle_values(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.op(path, FieldOp::Toggle(values))
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[(String, FieldOp)] {
        &self.ops
    }

    /// Apply every operation in order
    pub fn apply(&self, doc: &mut Document) {
        for (path, op) in &self.ops {
            let next = match op {
                FieldOp::SetIfPresent(value) => {
                    if is_absent(value) {
                        continue;
                    }
                    value.clone()
                }
                FieldOp::Set(value) => value.clone(),
                FieldOp::Flip(value) => {
                    if get_path(doc, path) == Some(value) {
                        Value::Null
                    } else {
                        value.clone()
                    }
                }
                FieldOp::Toggle(candidate) => {
                    Value::Array(toggle(&array_at(doc, path), candidate))
                }
                FieldOp::Remove(removed) => {
                    Value::Array(difference(&array_at(doc, path), removed))
                }
                FieldOp::Add(added) => Value::Array(union(&array_at(doc, path), added)),
            };
            set_path(doc, path, next);
        }
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub fn id_value(id: RecordId) -> Value {
    Value::String(id.to_string())
}

/// Identifier stored in a document, if any
pub fn document_id(doc: &Document) -> Option<RecordId> {
    doc.get(ID_FIELD)?.as_str()?.parse().ok()
}

/// Resolve a dotted path such as `general.name`
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}

/// Write a dotted path, creating intermediate objects as needed
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = doc;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        map.insert(last.to_string(), value);
    }
}

/// The array at `path`; missing or null fields read as empty
fn array_at(doc: &Document, path: &str) -> Vec<Value> {
    match get_path(doc, path) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// String values at `path`, flattening one level of array
pub fn strings_at(doc: &Document, path: &str) -> Vec<String> {
    match get_path(doc, path) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_paths() {
        let mut doc = json!({"id": "x"});
        set_path(&mut doc, "general.name", json!("C172"));
        assert_eq!(get_path(&doc, "general.name"), Some(&json!("C172")));
        assert_eq!(get_path(&doc, "general.model"), None);
    }

    #[test]
    fn test_filter_eq_matches_array_membership() {
        let doc = json!({"airlines": ["a", "b"], "general": {"name": "Dash 8"}});
        assert!(Filter::eq("airlines", "b").matches(&doc));
        assert!(!Filter::eq("airlines", "c").matches(&doc));
        assert!(Filter::eq("general.name", "Dash 8").matches(&doc));
    }

    #[test]
    fn test_filter_by_id() {
        let id = RecordId::generate();
        let doc = json!({"id": id.to_string()});
        assert!(Filter::by_id(id).matches(&doc));
        assert!(!Filter::by_id(RecordId::generate()).matches(&doc));
        assert!(Filter::All.matches(&doc));
    }

    #[test]
    fn test_set_if_present_keeps_existing_on_empty() {
        let mut doc = json!({"model": "PT6A", "tbo": 3600});
        Update::new()
            .set_if_present("model", "")
            .set_if_present("tbo", Value::Null)
            .set_if_present("hst", 1800)
            .apply(&mut doc);
        assert_eq!(doc, json!({"model": "PT6A", "tbo": 3600, "hst": 1800}));
    }

    #[test]
    fn test_toggle_on_missing_array_adds() {
        let id = RecordId::generate();
        let mut doc = json!({});
        Update::new().toggle_ids("engines", &[id]).apply(&mut doc);
        assert_eq!(doc["engines"], json!([id.to_string()]));
        Update::new().toggle_ids("engines", &[id]).apply(&mut doc);
        assert_eq!(doc["engines"], json!([]));
    }

    #[test]
    fn test_remove_never_adds() {
        let id = RecordId::generate();
        let mut doc = json!({"history": []});
        Update::new().remove_ids("history", &[id]).apply(&mut doc);
        assert_eq!(doc["history"], json!([]));
    }

    #[test]
    fn test_add_never_removes() {
        let id = RecordId::generate();
        let mut doc = json!({"history": [id.to_string()]});
        Update::new().add_ids("history", &[id]).apply(&mut doc);
        assert_eq!(doc["history"], json!([id.to_string()]));
    }

    #[test]
    fn test_flip_sets_then_clears() {
        let aircraft = RecordId::generate();
        let mut doc = json!({"owningAircraft": null});
        Update::new().flip("owningAircraft", aircraft).apply(&mut doc);
        assert_eq!(doc["owningAircraft"], id_value(aircraft));
        Update::new().flip("owningAircraft", aircraft).apply(&mut doc);
        assert_eq!(doc["owningAircraft"], Value::Null);
    }

    #[test]
    fn test_strings_at_flattens_arrays() {
        let doc = json!({"airlines": ["a", "b"], "general": {"name": "Otter"}});
        assert_eq!(strings_at(&doc, "airlines"), vec!["a", "b"]);
        assert_eq!(strings_at(&doc, "general.name"), vec!["Otter"]);
        assert!(strings_at(&doc, "missing").is_empty());
    }
}
