//! Content model: field values, block snapshots and change-sets
//!
//! Field values arrive from the host store and from model output as loosely
//! typed JSON. They are normalized here into a recursive `FieldValue` so the
//! patch, sanitize and diff code can recurse over a closed set of shapes.

mod sanitize;

pub use sanitize::sanitize_value;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key the host store uses to tag a block with its layout name
pub const LAYOUT_KEY: &str = "acf_fc_layout";

/// Field name to value mapping for one block
pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value
///
/// Repeatable sub-structures (repeater rows, groups) are `Collection`s.
/// JSON arrays are keyed by their decimal index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Collection(Fields),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Emptiness as the host store judges it: "", "0", zero, or no children
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty() || s == "0",
            FieldValue::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
            FieldValue::Collection(fields) => fields.is_empty(),
        }
    }

    /// Plain rendering used where token diffs make no sense
    pub fn to_plain_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Collection(_) => {
                serde_json::to_string_pretty(self).unwrap_or_default()
            }
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => FieldValue::Number(n),
            Value::Bool(true) => FieldValue::text("1"),
            Value::Bool(false) | Value::Null => FieldValue::text(""),
            Value::Array(items) => FieldValue::Collection(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), FieldValue::from(v)))
                    .collect(),
            ),
            Value::Object(map) => FieldValue::Collection(fields_from_map(map)),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from)
    }
}

/// Convert a JSON object into a field map
pub fn fields_from_map(map: serde_json::Map<String, Value>) -> Fields {
    map.into_iter()
        .map(|(k, v)| (k, FieldValue::from(v)))
        .collect()
}

/// Keep only the fields an editor can meaningfully rewrite.
///
/// Drops empty values and the layout marker, keeps text and numbers, and
/// recurses into collections, dropping those left empty.
pub fn text_fields(fields: &Fields) -> Fields {
    let mut kept = Fields::new();
    for (key, value) in fields {
        if key == LAYOUT_KEY || value.is_empty() {
            continue;
        }
        match value {
            FieldValue::Text(_) | FieldValue::Number(_) => {
                kept.insert(key.clone(), value.clone());
            }
            FieldValue::Collection(children) => {
                let filtered = text_fields(children);
                if !filtered.is_empty() {
                    kept.insert(key.clone(), FieldValue::Collection(filtered));
                }
            }
        }
    }
    kept
}

/// State of one content block at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    pub block_index: usize,
    pub layout: String,
    pub fields: Fields,
}

impl FieldSnapshot {
    /// Build a snapshot from a raw host-store block, reading the layout marker
    pub fn from_raw(block_index: usize, raw: serde_json::Map<String, Value>) -> Self {
        let layout = raw
            .get(LAYOUT_KEY)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let mut fields = fields_from_map(raw);
        fields.remove(LAYOUT_KEY);
        Self {
            block_index,
            layout,
            fields,
        }
    }

    /// Same block with only its editable text fields
    pub fn text_only(&self) -> Self {
        Self {
            block_index: self.block_index,
            layout: self.layout.clone(),
            fields: text_fields(&self.fields),
        }
    }
}

/// Proposed edits for one block of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockChange {
    pub index: usize,
    pub fields: Fields,
}

/// Field edits proposed by the model, pending user approval
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChangeSet {
    Single {
        #[serde(rename = "blockIndex")]
        block_index: usize,
        fields: Fields,
    },
    Page {
        blocks: Vec<BlockChange>,
    },
}

impl ChangeSet {
    /// Interpret a parsed JSON value as a change-set.
    ///
    /// A `fields` object makes a single-block change-set; a `modules` or
    /// `blocks` array makes a page change-set. Anything else is not a
    /// change-set. Malformed page entries are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let page_mode = obj.get("mode").and_then(Value::as_str) == Some("page");

        if !page_mode {
            if let Some(Value::Object(fields)) = obj.get("fields") {
                let block_index = obj
                    .get("blockIndex")
                    .or_else(|| obj.get("block_index"))
                    .and_then(index_of)
                    .unwrap_or(0);
                return Some(ChangeSet::Single {
                    block_index,
                    fields: fields_from_map(fields.clone()),
                });
            }
        }

        let entries = obj
            .get("modules")
            .or_else(|| obj.get("blocks"))
            .and_then(Value::as_array)?;

        let blocks = entries
            .iter()
            .filter_map(|entry| {
                let index = entry.get("index").and_then(index_of)?;
                let fields = entry.get("fields")?.as_object()?;
                Some(BlockChange {
                    index,
                    fields: fields_from_map(fields.clone()),
                })
            })
            .collect();

        Some(ChangeSet::Page { blocks })
    }

    /// Total number of field edits proposed
    pub fn field_count(&self) -> usize {
        match self {
            ChangeSet::Single { fields, .. } => fields.len(),
            ChangeSet::Page { blocks } => blocks.iter().map(|b| b.fields.len()).sum(),
        }
    }
}

impl<'de> Deserialize<'de> for ChangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ChangeSet::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom("expected a `fields` object or a `modules`/`blocks` array")
        })
    }
}

/// Block indices come over the wire as numbers or numeric strings
fn index_of(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
