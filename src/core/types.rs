use std::cmp::Ordering;
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::error::{Error, ErrorKind, Result};

/// Internal document sequence number, assigned on first insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

/// Recursive document value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "string",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }

    /// Walk a dotted path through nested objects, `self` being the root
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        path.split('.').try_fold(self, |current, segment| {
            current.as_object().and_then(|map| map.get(segment))
        })
    }

    /// Native ordering between two scalars of the same type.
    /// Values of different types are not comparable. Numbers always order,
    /// NaN falling back to the IEEE total order.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                Some(a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)))
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Bucket key used by facet indexes; only scalars have one
    pub fn facet_key(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Object(
                map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect()
            ),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(b),
            // Integral numbers go back out as integers so callers get what they stored
            FieldValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Value::from(n as i64)
            }
            FieldValue::Number(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            FieldValue::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
            ),
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

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<f32> for FieldValue {
    fn from(n: f32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// A stored document. `fields` includes the `id` field itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldValue::Text(id.clone()));
        Document { id, fields }
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::new(
                ErrorKind::InvalidDocument,
                format!("document must be a JSON object, got {}", json_type_name(&value)),
            ));
        };

        let id = match map.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::String(_)) => {
                return Err(Error::new(ErrorKind::InvalidDocument, "field 'id' must not be empty"));
            }
            Some(other) => {
                return Err(Error::new(
                    ErrorKind::InvalidDocument,
                    format!("field 'id' must be a string, got {}", json_type_name(other)),
                ));
            }
            None => return Err(Error::new(ErrorKind::InvalidDocument, "missing field 'id'")),
        };

        let fields = map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect();
        Ok(Document { id, fields })
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Dotted-path lookup, e.g. `review.rating`
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        match path.split_once('.') {
            None => self.fields.get(path),
            Some((head, rest)) => self.fields.get(head)?.get_path(rest),
        }
    }
}

impl TryFrom<Value> for Document {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Document::from_json(value)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
