#![allow(dead_code)]

use std::sync::Arc;
use docsift::{Config, Database, Index, SearchResult};
use serde_json::{json, Value};

pub fn catalog_schema() -> Value {
    json!({
        "title": "catalog",
        "additionalProperties": false,
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "name": {"type": "string"},
            "price": {"type": "number"},
            "brand": {"type": "string", "facet": true},
            "labels": {"type": "string", "facet": true},
            "popularity": {"type": "number"},
            "review": {
                "type": "object",
                "properties": {
                    "author": {"type": "string"},
                    "rating": {"type": "number"}
                }
            }
        }
    })
}

pub fn catalog_docs() -> Vec<Value> {
    vec![
        json!({"id": "1", "name": "fiona handbag", "price": 99.9, "brand": "michael kors", "labels": "purses",
               "popularity": 8, "review": {"author": "alice", "rating": 7}}),
        json!({"id": "2", "name": "tote bag", "price": 49, "brand": "coach", "labels": "handbags",
               "popularity": 9, "review": {"author": "olivia", "rating": 8.3}}),
        json!({"id": "3", "name": "sling bag", "price": 75, "brand": "coach", "labels": "purses",
               "popularity": 9, "review": {"author": "alice", "rating": 9.2}}),
        json!({"id": "4", "name": "sneakers shoes", "price": 40, "brand": "adidas", "labels": "shoes",
               "popularity": 10, "review": {"author": "olivia", "rating": 9}}),
        json!({"id": "5", "name": "running shoes", "price": 89, "brand": "nike", "labels": "shoes",
               "popularity": 10, "review": {"author": "olivia", "rating": 8.5}}),
        json!({"id": "6", "name": "running shorts", "price": 35, "brand": "adidas", "labels": "clothing",
               "popularity": 7, "review": {"author": "olivia", "rating": 7.5}}),
    ]
}

pub fn vector_schema() -> Value {
    json!({
        "title": "my_embeddings",
        "additionalProperties": false,
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "document": {"type": "string"},
            "metadata": {"type": "object"},
            "embeddings": {"type": "array", "format": "vector", "dimensions": 3}
        }
    })
}

pub fn vector_docs() -> Vec<Value> {
    vec![
        json!({"id": "id_1", "document": "First document", "metadata": {"category": "shoes"},
               "embeddings": [1.2, 2.3, 4.5]}),
        json!({"id": "id_2", "document": "Another document", "metadata": {"category": "clothing"},
               "embeddings": [6.7, 8.2, 9.2]}),
    ]
}

pub fn catalog_with(config: Config) -> (Database, Arc<Index>) {
    let db = Database::new(config);
    let index = db.create_or_update_index("catalog", &catalog_schema()).unwrap();
    for status in index.create_many(catalog_docs()) {
        assert!(status.is_ok(), "{:?}", status);
    }
    (db, index)
}

pub fn catalog() -> (Database, Arc<Index>) {
    catalog_with(Config::default())
}

pub fn hit_ids(result: &SearchResult) -> Vec<String> {
    result.hits
        .iter()
        .filter_map(|h| h.doc.get("id").and_then(Value::as_str).map(str::to_string))
        .collect()
}
