mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use docsift::{Config, Database, Filter, Query};
use serde_json::json;

const BATCH: usize = 200;

#[test]
fn test_readers_see_whole_batches() {
    let db = Database::new(Config {
        query_cache_size: 0,
        ..Config::default()
    });
    let index = db.create_or_update_index("catalog", &common::catalog_schema()).unwrap();
    let docs: Vec<_> = (0..BATCH)
        .map(|i| json!({"id": i.to_string(), "name": format!("item {}", i), "price": i, "brand": "acme"}))
        .collect();

    let done = AtomicBool::new(false);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let found = index.search(&Query::text("item")).unwrap().meta.found;
                    assert!(found == 0 || found == BATCH, "observed partial batch: {}", found);

                    let facets = index.search(&Query::new().facet("brand")).unwrap();
                    let acme = facets.facet("brand").unwrap().count("acme") as usize;
                    assert!(acme == 0 || acme == BATCH);
                }
            });
        }

        s.spawn(|| {
            let statuses = index.create_many(docs.clone());
            assert!(statuses.iter().all(|s| s.is_ok()));
            done.store(true, Ordering::Release);
        });
    });

    assert_eq!(index.count(), BATCH);
}

#[test]
fn test_parallel_queries_agree() {
    let (_db, index) = common::catalog();
    let query = Query::text("bag").filter(Filter::lte("price", 80));

    let counts: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| index.search(&query).unwrap().meta.found))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(counts.iter().all(|&c| c == 2));
}
