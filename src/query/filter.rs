use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldValue;

/// Leaf comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Operator key in the JSON filter encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "$eq",
            Comparison::Ne => "$not",
            Comparison::Gt => "$gt",
            Comparison::Gte => "$gte",
            Comparison::Lt => "$lt",
            Comparison::Lte => "$lte",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "$eq" => Some(Comparison::Eq),
            "$not" | "$ne" => Some(Comparison::Ne),
            "$gt" => Some(Comparison::Gt),
            "$gte" => Some(Comparison::Gte),
            "$lt" => Some(Comparison::Lt),
            "$lte" => Some(Comparison::Lte),
            _ => None,
        }
    }
}

/// Immutable filter expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Filter {
    Leaf {
        op: Comparison,
        field: String,
        value: FieldValue,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    pub fn leaf(op: Comparison, field: &str, value: impl Into<FieldValue>) -> Self {
        Filter::Leaf {
            op,
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Eq, field, value)
    }

    pub fn ne(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Ne, field, value)
    }

    pub fn gt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Gt, field, value)
    }

    pub fn gte(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Gte, field, value)
    }

    pub fn lt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Lt, field, value)
    }

    pub fn lte(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::leaf(Comparison::Lte, field, value)
    }

    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    /// Conjunction of every filter, right-leaning; None when empty
    pub fn all(filters: Vec<Filter>) -> Option<Self> {
        fold_right(filters, Filter::and)
    }

    /// Disjunction of every filter, right-leaning; None when empty
    pub fn any(filters: Vec<Filter>) -> Option<Self> {
        fold_right(filters, Filter::or)
    }

    /// Every field path referenced by the tree, leftmost first
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Leaf { field, .. } => out.push(field),
            Filter::And(l, r) | Filter::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
        }
    }

    /// Parse the JSON encoding:
    /// `{"brand": "nike"}`, `{"price": {"$gte": 40, "$lte": 90}}`,
    /// `{"$and": [..]}`, `{"$or": [..]}`. Several keys in one object are and-ed.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(invalid_filter("filter must be a JSON object"));
        };
        parse_object(map, "")
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::Leaf { op: Comparison::Eq, field, value } => {
                single(field, value.to_json())
            }
            Filter::Leaf { op, field, value } => {
                single(field, single(op.as_str(), value.to_json()))
            }
            Filter::And(l, r) => single("$and", Value::Array(vec![l.to_json(), r.to_json()])),
            Filter::Or(l, r) => single("$or", Value::Array(vec![l.to_json(), r.to_json()])),
        }
    }
}

fn fold_right(filters: Vec<Filter>, join: fn(Filter, Filter) -> Filter) -> Option<Filter> {
    filters.into_iter().rev().reduce(|acc, next| join(next, acc))
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn invalid_filter(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidQuery, context)
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn parse_object(map: &Map<String, Value>, prefix: &str) -> Result<Filter> {
    let mut clauses = Vec::with_capacity(map.len());

    for (key, value) in map {
        let clause = match key.as_str() {
            "$and" | "$or" if prefix.is_empty() => {
                let Value::Array(items) = value else {
                    return Err(invalid_filter(format!("'{}' expects an array of filters", key)));
                };
                let filters = items.iter()
                    .map(Filter::from_json)
                    .collect::<Result<Vec<_>>>()?;
                let combined = if key == "$and" { Filter::all(filters) } else { Filter::any(filters) };
                combined.ok_or_else(|| invalid_filter(format!("'{}' must not be empty", key)))?
            }
            op if op.starts_with('$') => {
                return Err(invalid_filter(format!("unexpected operator '{}'", op)));
            }
            field => parse_field(&join_path(prefix, field), value)?,
        };
        clauses.push(clause);
    }

    Filter::all(clauses).ok_or_else(|| invalid_filter("filter must not be empty"))
}

/// `value` is either a literal (equality), an operator object, or a nested
/// object whose keys extend the path
fn parse_field(path: &str, value: &Value) -> Result<Filter> {
    let Value::Object(map) = value else {
        return Ok(Filter::eq(path, FieldValue::from(value.clone())));
    };

    let operators = map.keys().filter(|k| k.starts_with('$')).count();
    if operators == 0 {
        return parse_object(map, path);
    }
    if operators != map.len() {
        return Err(invalid_filter(format!("field '{}' mixes operators and nested fields", path)));
    }

    let leaves = map.iter()
        .map(|(op, operand)| {
            let op = Comparison::parse(op)
                .ok_or_else(|| invalid_filter(format!("unknown operator '{}' on field '{}'", op, path)))?;
            Ok(Filter::leaf(op, path, FieldValue::from(operand.clone())))
        })
        .collect::<Result<Vec<_>>>()?;

    Filter::all(leaves).ok_or_else(|| invalid_filter(format!("field '{}' has no operators", path)))
}

impl TryFrom<Value> for Filter {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Filter::from_json(&value)
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        filter.to_json()
    }
}
