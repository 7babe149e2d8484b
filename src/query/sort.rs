use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldValue;
use crate::search::results::ScoredDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "$asc",
            SortOrder::Desc => "$desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        SortKey { field: field.to_string(), order: SortOrder::Asc }
    }

    pub fn descending(field: &str) -> Self {
        SortKey { field: field.to_string(), order: SortOrder::Desc }
    }

    /// Parse `[{"popularity": "$desc"}, {"review.rating": "$asc"}]`;
    /// a single object may carry one key or several, applied in key order.
    pub fn from_json(value: &Value) -> Result<Vec<SortKey>> {
        let objects: Vec<&Map<String, Value>> = match value {
            Value::Array(items) => items.iter()
                .map(|item| item.as_object().ok_or_else(|| invalid_sort("sort entries must be objects")))
                .collect::<Result<_>>()?,
            Value::Object(map) => vec![map],
            _ => return Err(invalid_sort("sort must be an object or an array of objects")),
        };

        let mut keys = Vec::new();
        for map in objects {
            for (field, order) in map {
                let order = match order.as_str() {
                    Some("$asc") => SortOrder::Asc,
                    Some("$desc") => SortOrder::Desc,
                    _ => return Err(invalid_sort(format!("sort order for '{}' must be \"$asc\" or \"$desc\"", field))),
                };
                keys.push(SortKey { field: field.clone(), order });
            }
        }
        Ok(keys)
    }

    pub fn to_json(keys: &[SortKey]) -> Value {
        Value::Array(keys.iter()
            .map(|key| {
                let mut map = Map::new();
                map.insert(key.field.clone(), Value::String(key.order.as_str().to_string()));
                Value::Object(map)
            })
            .collect())
    }
}

/// Serde adapter that reads and writes `sort_by` in its `$asc`/`$desc` form
pub(crate) mod sort_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;
    use super::SortKey;

    pub fn serialize<S: Serializer>(keys: &[SortKey], serializer: S) -> Result<S::Ok, S::Error> {
        SortKey::to_json(keys).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SortKey>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            value => SortKey::from_json(&value).map_err(D::Error::custom),
        }
    }
}

fn invalid_sort(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidQuery, context)
}

/// Stable multi-key sort over scored candidates
pub struct SortEngine;

impl SortEngine {
    /// Missing values sort last whatever the direction; remaining ties fall
    /// back to insertion order.
    pub fn sort(hits: &mut [ScoredDocument<'_>], keys: &[SortKey]) {
        hits.sort_by(|a, b| {
            keys.iter()
                .map(|key| compare_key(
                    a.document.get_path(&key.field),
                    b.document.get_path(&key.field),
                    key.order,
                ))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
    }

    /// Score descending, insertion order on ties
    pub fn sort_by_score(hits: &mut [ScoredDocument<'_>]) {
        hits.sort_by(|a, b| {
            b.score.total_cmp(&a.score)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
    }

    /// Vector distance ascending, insertion order on ties
    pub fn sort_by_distance(hits: &mut [ScoredDocument<'_>]) {
        hits.sort_by(|a, b| {
            let da = a.vector_distance.unwrap_or(f32::INFINITY);
            let db = b.vector_distance.unwrap_or(f32::INFINITY);
            da.total_cmp(&db)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
    }
}

fn compare_key(a: Option<&FieldValue>, b: Option<&FieldValue>, order: SortOrder) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.compare(b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Orders values of different types against each other
fn type_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Boolean(_) => 1,
        FieldValue::Number(_) => 2,
        FieldValue::Text(_) => 3,
        FieldValue::Array(_) => 4,
        FieldValue::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DocId, Document};
    use serde_json::json;

    fn docs() -> Vec<Document> {
        [
            json!({"id": "a", "popularity": 10, "review": {"rating": 7.0}}),
            json!({"id": "b", "popularity": 20, "review": {"rating": 5.0}}),
            json!({"id": "c", "review": {"rating": 9.0}}),
            json!({"id": "d", "popularity": 10, "review": {"rating": 9.5}}),
            json!({"id": "e", "popularity": 10, "review": {"rating": 7.0}}),
        ]
        .into_iter()
        .map(|v| Document::from_json(v).unwrap())
        .collect()
    }

    fn scored(docs: &[Document]) -> Vec<ScoredDocument<'_>> {
        docs.iter()
            .enumerate()
            .map(|(i, document)| ScoredDocument {
                doc_id: DocId(i as u64),
                score: 0.0,
                vector_distance: None,
                document,
            })
            .collect()
    }

    fn ids(hits: &[ScoredDocument<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.document.id.clone()).collect()
    }

    #[test]
    fn multi_key_mixed_directions() {
        let docs = docs();
        let mut hits = scored(&docs);
        SortEngine::sort(&mut hits, &[SortKey::descending("popularity"), SortKey::ascending("review.rating")]);
        assert_eq!(ids(&hits), vec!["b", "a", "e", "d", "c"]);
    }

    #[test]
    fn missing_values_last_in_both_directions() {
        let docs = docs();
        let mut hits = scored(&docs);
        SortEngine::sort(&mut hits, &[SortKey::ascending("popularity")]);
        assert_eq!(ids(&hits).last().map(String::as_str), Some("c"));

        SortEngine::sort(&mut hits, &[SortKey::descending("popularity")]);
        assert_eq!(ids(&hits).last().map(String::as_str), Some("c"));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let docs = docs();
        let mut hits = scored(&docs);
        hits.reverse();
        SortEngine::sort(&mut hits, &[SortKey::descending("review.rating")]);
        assert_eq!(ids(&hits), vec!["d", "c", "a", "e", "b"]);
    }

    #[test]
    fn nan_values_sort_deterministically() {
        let docs: Vec<Document> = (0..60)
            .map(|i| {
                let mut doc = Document::new(i.to_string());
                let price = if i % 3 == 0 { f64::NAN } else { (i % 7) as f64 };
                doc.add_field("price", price);
                doc
            })
            .collect();
        let mut hits = scored(&docs);
        SortEngine::sort(&mut hits, &[SortKey::ascending("price")]);

        assert_eq!(hits.len(), 60);
        let tail = &hits[40..];
        assert!(tail.iter().all(|h| h.document.get_field("price").and_then(FieldValue::as_number).is_some_and(f64::is_nan)));
        assert!(tail.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
    }

    #[test]
    fn parses_json_sort() {
        let keys = SortKey::from_json(&json!([{"popularity": "$desc"}, {"review.rating": "$asc"}])).unwrap();
        assert_eq!(keys, vec![SortKey::descending("popularity"), SortKey::ascending("review.rating")]);
        assert_eq!(SortKey::from_json(&SortKey::to_json(&keys)).unwrap(), keys);

        let err = SortKey::from_json(&json!({"popularity": "down"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidQuery);
    }
}
