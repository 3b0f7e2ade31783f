//! Dynamically-typed `fields` values
//!
//! `fields` is heterogeneous by design: string keys map to
//! string / number / boolean / nested-object / array values. Rather than carry
//! everything as a string, normalized and ComfyUI-derived values keep their
//! native shape through a tagged sum type.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as Json;

/// A single value inside the `fields` map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<FieldValue>),
    Object(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, FieldValue::Object(_))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<Json> for FieldValue {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => FieldValue::Null,
            Json::Bool(b) => FieldValue::Bool(b),
            Json::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Json::String(s) => FieldValue::String(s),
            Json::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Json::Object(map) => {
                FieldValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
