//! Tagged record: the `{type, data}` JSON envelope every trigger and action
//! is persisted as.
//!
//! Field readers here are deliberately lenient: a missing or malformed field
//! yields `None` so the caller keeps the variant's default for that field
//! alone.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::comparator::Comparator;

/// Persisted form of a trigger or action node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable kind tag resolved through the [`Registry`](super::Registry).
    #[serde(rename = "type")]
    pub kind: String,
    /// Variant fields.
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Record {
    /// Build a record from a kind tag and a `data` object.
    #[must_use]
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Read a record out of an arbitrary JSON value.
    ///
    /// Returns `None` when the value is not an object or carries no string
    /// `type`. A missing `data` becomes an empty object.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let kind = object.get("type")?.as_str()?;
        let data = object.get("data").cloned().unwrap_or_else(empty_object);
        Some(Self::new(kind, data))
    }

    /// Convert into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "type": self.kind, "data": self.data })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Read a number; numeric strings are accepted.
#[must_use]
pub fn read_f64(data: &Value, key: &str) -> Option<f64> {
    let value = match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite())
}

/// Read a whole number; integer-valued floats and numeric strings are
/// accepted, fractional values are rejected.
#[must_use]
pub fn read_i64(data: &Value, key: &str) -> Option<i64> {
    match data.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15).then_some(v as i64)
}

/// Read a string.
#[must_use]
pub fn read_string(data: &Value, key: &str) -> Option<String> {
    data.get(key)?.as_str().map(str::to_string)
}

/// Read a boolean.
#[must_use]
pub fn read_bool(data: &Value, key: &str) -> Option<bool> {
    data.get(key)?.as_bool()
}

/// Read a comparator by its wire name (e.g. `"IS_EQUAL"`).
#[must_use]
pub fn read_comparator(data: &Value, key: &str) -> Option<Comparator> {
    serde_json::from_value(data.get(key)?.clone()).ok()
}
