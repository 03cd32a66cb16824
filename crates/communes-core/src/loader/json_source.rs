// crates/communes-core/src/loader/json_source.rs
use super::common_io;
use super::{clean, RawRecord};
use crate::error::Result;
use serde_json::{Map, Value};
use std::path::Path;

const NAME_KEYS: &[&str] = &["name", "nom", "nom_commune"];
const CP_KEYS: &[&str] = &["cp", "postal_code", "postalCode", "code_postal"];
const DEPT_KEYS: &[&str] = &["dept", "department", "departmentToken"];
const INSEE_KEYS: &[&str] = &["insee", "code_insee", "code_commune_insee"];
const REGION_KEYS: &[&str] = &["region"];

/// Key under which some files nest their array: `{"data": [...]}`.
const WRAPPER_KEY: &str = "data";

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Array,
    Wrapped(Map<String, Value>),
    Unrecognized,
}

/// A JSON source as read from disk, entries kept verbatim.
///
/// Used where entries must be written back untouched (dedup in place): the
/// original objects, their extra keys and the wrapper object all survive.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    shape: Shape,
    pub entries: Vec<Value>,
}

impl JsonDocument {
    /// Parses a document. Empty files and unrecognized shapes give no
    /// entries; malformed JSON is an error.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = common_io::read_bytes(path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self {
                shape: Shape::Unrecognized,
                entries: Vec::new(),
            });
        }
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(entries) => Self {
                shape: Shape::Array,
                entries,
            },
            Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
                Some(Value::Array(entries)) => Self {
                    shape: Shape::Wrapped(map),
                    entries,
                },
                _ => Self {
                    shape: Shape::Unrecognized,
                    entries: Vec::new(),
                },
            },
            _ => Self {
                shape: Shape::Unrecognized,
                entries: Vec::new(),
            },
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.shape != Shape::Unrecognized
    }

    /// Normalized view of every object entry. Non-object entries are
    /// dropped from the view.
    pub fn records(&self) -> Vec<RawRecord> {
        self.entries.iter().filter_map(raw_from_value).collect()
    }

    /// Rebuilds the document in its original shape.
    pub fn into_value(self) -> Value {
        match self.shape {
            Shape::Array | Shape::Unrecognized => Value::Array(self.entries),
            Shape::Wrapped(mut map) => {
                map.insert(WRAPPER_KEY.to_string(), Value::Array(self.entries));
                Value::Object(map)
            }
        }
    }
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => clean(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn pick(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(scalar))
}

/// Normalizes one JSON entry. `None` when it is not an object.
pub fn raw_from_value(v: &Value) -> Option<RawRecord> {
    let obj = v.as_object()?;
    Some(RawRecord {
        name: pick(obj, NAME_KEYS),
        postal_code: pick(obj, CP_KEYS),
        department: pick(obj, DEPT_KEYS),
        insee: pick(obj, INSEE_KEYS),
        region: pick(obj, REGION_KEYS),
    })
}

/// Loads a JSON source (bare array or `{"data": [...]}`) into normalized
/// records.
pub fn load_json(path: &Path) -> Result<Vec<RawRecord>> {
    let doc = JsonDocument::read(path)?;
    if !doc.is_recognized() {
        tracing::debug!(path = %path.display(), "no record array in JSON source");
    }
    Ok(doc.records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_bare_arrays_and_wrapped_objects() {
        let bare = JsonDocument::from_value(json!([{ "name": "Lyon", "cp": "69001", "dept": "69" }]));
        let wrapped = JsonDocument::from_value(json!({
            "version": 2,
            "data": [{ "name": "Lyon", "cp": "69001", "dept": "69" }]
        }));
        assert_eq!(bare.records(), wrapped.records());
        assert_eq!(bare.records()[0].postal_code.as_deref(), Some("69001"));
    }

    #[test]
    fn unrecognized_shapes_are_empty() {
        assert!(JsonDocument::from_value(json!({ "cities": [] })).records().is_empty());
        assert!(!JsonDocument::from_value(json!(42)).is_recognized());
    }

    #[test]
    fn normalizes_aliases_and_numbers() {
        let raw = raw_from_value(&json!({
            "nom": " Évian-les-Bains ",
            "code_postal": 74500,
            "department": "74",
            "code_insee": "74119"
        }))
        .unwrap();
        assert_eq!(raw.name.as_deref(), Some("Évian-les-Bains"));
        assert_eq!(raw.postal_code.as_deref(), Some("74500"));
        assert_eq!(raw.department.as_deref(), Some("74"));
        assert_eq!(raw.insee.as_deref(), Some("74119"));
        assert_eq!(raw.region, None);
    }

    #[test]
    fn wrapper_survives_round_trip() {
        let value = json!({ "version": 2, "data": [{ "name": "A" }, 7] });
        let doc = JsonDocument::from_value(value.clone());
        assert_eq!(doc.records().len(), 1);
        assert_eq!(doc.into_value(), value);
    }
}
