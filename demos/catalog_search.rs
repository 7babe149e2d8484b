/// Catalog search walkthrough
///
/// Creates an index from a JSON schema, loads a small catalog, then runs
/// text, filtered, faceted, sorted and vector queries against it.
/// Run with `RUST_LOG=docsift=debug` to see each query stage.

use docsift::{Database, Filter, Query, SearchResult, SortKey};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn print_hits(label: &str, result: &SearchResult) {
    println!("  {} ({} found)", label, result.meta.found);
    for hit in &result.hits {
        println!("    {}  score={:.1}", hit.doc, hit.meta.text_match.score);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let db = Database::default();

    println!("Creating catalog index...");
    let catalog = db.create_or_update_index("catalog", &json!({
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
    }))?;

    let statuses = catalog.create_many(vec![
        json!({"id": "1", "name": "fiona handbag", "price": 99.9, "brand": "michael kors", "labels": "purses", "popularity": 8, "review": {"author": "alice", "rating": 7}}),
        json!({"id": "2", "name": "tote bag", "price": 49, "brand": "coach", "labels": "handbags", "popularity": 9, "review": {"author": "olivia", "rating": 8.3}}),
        json!({"id": "3", "name": "sling bag", "price": 75, "brand": "coach", "labels": "purses", "popularity": 9, "review": {"author": "alice", "rating": 9.2}}),
        json!({"id": "4", "name": "sneakers shoes", "price": 40, "brand": "adidas", "labels": "shoes", "popularity": 10, "review": {"author": "olivia", "rating": 9}}),
        json!({"id": "5", "name": "running shoes", "price": 89, "brand": "nike", "labels": "shoes", "popularity": 10, "review": {"author": "olivia", "rating": 8.5}}),
        json!({"id": "6", "name": "running shorts", "price": 35, "brand": "adidas", "labels": "clothing", "popularity": 7, "review": {"author": "olivia", "rating": 7.5}}),
        json!({"id": "7", "name": "broken", "price": "free"}),
    ]);
    for status in statuses.iter().filter(|s| !s.is_ok()) {
        println!("  rejected '{}': {}", status.id, status.error.as_deref().unwrap_or_default());
    }
    println!("  {} documents indexed\n", catalog.count());

    print_hits("q=running", &catalog.search(&Query::text("running"))?);

    let filtered = catalog.search(&Query::text("running")
        .filter(Filter::and(Filter::gte("price", 40), Filter::lte("price", 90)))
        .facet("brand")
        .facet("labels"))?;
    print_hits("q=running, 40 <= price <= 90", &filtered);
    for (field, dist) in &filtered.meta.facets {
        let counts: Vec<String> = dist.counts.iter().map(|c| format!("{}={}", c.value, c.count)).collect();
        println!("    facet {}: {}", field, counts.join(", "));
    }

    print_hits("sorted by popularity, rating", &catalog.search(&Query::new()
        .sort(SortKey::descending("popularity"))
        .sort(SortKey::descending("review.rating"))
        .include(&["name", "popularity", "review.rating"]))?);

    println!("\nCreating embeddings index...");
    let embeddings = db.create_or_update_index("my_embeddings", &json!({
        "title": "my_embeddings",
        "properties": {
            "id": {"type": "string"},
            "document": {"type": "string"},
            "metadata": {"type": "object"},
            "embeddings": {"type": "array", "format": "vector", "dimensions": 3}
        }
    }))?;
    embeddings.create_many(vec![
        json!({"id": "id_1", "document": "First document", "metadata": {"category": "shoes"}, "embeddings": [1.2, 2.3, 4.5]}),
        json!({"id": "id_2", "document": "Another document", "metadata": {"category": "clothing"}, "embeddings": [6.7, 8.2, 9.2]}),
    ]);

    let nearest = embeddings.search(&Query::new().vector("embeddings", vec![1.0, 2.1, 3.2]))?;
    for hit in &nearest.hits {
        println!("    {}  distance={:.3}", hit.doc["id"], hit.meta.text_match.vector_distance.unwrap_or_default());
    }

    for info in db.list_indexes() {
        println!("index '{}' created {}", info.name, info.created_at);
    }
    db.delete_index("my_embeddings")?;
    Ok(())
}
