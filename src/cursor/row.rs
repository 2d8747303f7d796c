//! Metadata rows with defaulting field access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single field value of a metadata row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(b),
            FieldValue::Int(i) => serde_json::Value::from(i),
            FieldValue::Float(f) => serde_json::Value::from(f),
            FieldValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn as_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    fn as_long(&self) -> i64 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(b) => i64::from(*b),
            FieldValue::Int(i) => *i,
            FieldValue::Float(f) => *f as i64,
            FieldValue::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Int(i) => *i != 0,
            FieldValue::Float(f) => *f != 0.0,
            FieldValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "y" | "yes"
            ),
        }
    }
}

/// One row of a metadata result set.
///
/// Field labels are case-insensitive, like result-set column labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, FieldValue>", into = "BTreeMap<String, FieldValue>")]
pub struct MetaRow {
    fields: BTreeMap<String, FieldValue>,
}

impl From<BTreeMap<String, FieldValue>> for MetaRow {
    fn from(fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), v))
                .collect(),
        }
    }
}

impl From<MetaRow> for BTreeMap<String, FieldValue> {
    fn from(row: MetaRow) -> Self {
        row.fields
    }
}

impl MetaRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, label: &str, value: impl Into<FieldValue>) -> Self {
        self.set(label, value);
        self
    }

    pub fn set(&mut self, label: &str, value: impl Into<FieldValue>) {
        self.fields.insert(label.to_ascii_uppercase(), value.into());
    }

    /// Raw field access; `None` when the driver did not report the column.
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        self.fields.get(&label.to_ascii_uppercase())
    }

    pub fn has(&self, label: &str) -> bool {
        self.get(label).is_some_and(|v| !v.is_null())
    }

    /// String field, `""` when missing or null.
    pub fn safe_get_string(&self, label: &str) -> String {
        self.get(label).map(FieldValue::as_string).unwrap_or_default()
    }

    /// String field, `None` when missing, null or empty.
    pub fn get_non_empty(&self, label: &str) -> Option<String> {
        let value = self.safe_get_string(label);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Integer field, `0` when missing, null or unparsable.
    pub fn safe_get_int(&self, label: &str) -> i32 {
        let value = self.safe_get_long(label);
        i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
    }

    /// Long field, `0` when missing, null or unparsable.
    pub fn safe_get_long(&self, label: &str) -> i64 {
        self.get(label).map(FieldValue::as_long).unwrap_or(0)
    }

    /// Boolean field, `false` when missing or null.
    pub fn safe_get_boolean(&self, label: &str) -> bool {
        self.get(label).map(FieldValue::as_bool).unwrap_or(false)
    }
}
