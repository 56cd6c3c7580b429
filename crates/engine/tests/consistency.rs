//! End-to-end consistency tests: database-level mutators against both index
//! shapes, ordering, pagination and concurrency.

use stash_core::{codec, Value};
use stash_engine::{Database, Manager};
use std::sync::Arc;

fn doc(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Recompute what a fresh build would contain for one value, straight from
/// the set, and compare it to the index's answer as a multiset.
fn assert_bucket_matches_scan(db: &Database, index_name: &str, value: &str) {
    let index = db.get_index(index_name).unwrap();
    let set = db.get_set(index.set_name()).unwrap();
    let field = index.field().to_string();

    let mut expected = Vec::new();
    set.scan(|key, raw| {
        if codec::extract_field(raw, &field)?.as_deref() == Some(value) {
            expected.push(key.to_string());
        }
        Ok(())
    })
    .unwrap();

    let mut actual = index.query_equal(value);
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected, "bucket {value:?} diverged from the set");
}

#[test]
fn basic_index_stays_consistent_across_update() {
    let db = Database::new("d", None);
    db.create_set("s").unwrap();
    db.put("s", "k1", &doc(serde_json::json!({"n": "Alice", "a": 30})))
        .unwrap();
    db.put("s", "k2", &doc(serde_json::json!({"n": "Bob", "a": 25})))
        .unwrap();

    let index = db.create_basic_index("i", "s", "n").unwrap();

    db.put("s", "k1", &doc(serde_json::json!({"n": "Alex", "a": 30})))
        .unwrap();

    assert!(index.query_equal("Alice").is_empty());
    assert_eq!(index.query_equal("Alex"), vec!["k1"]);
    assert_eq!(index.query_equal("Bob"), vec!["k2"]);
    for value in ["Alice", "Alex", "Bob"] {
        assert_bucket_matches_scan(&db, "i", value);
    }
}

#[test]
fn missing_field_never_enters_a_bucket() {
    let db = Database::new("d", None);
    db.create_set("s").unwrap();
    db.put("s", "k1", &doc(serde_json::json!({"n": "Alex", "a": 30})))
        .unwrap();
    db.put("s", "k2", &doc(serde_json::json!({"n": "Bob", "a": 25})))
        .unwrap();
    let index = db.create_basic_index("i", "s", "n").unwrap();

    db.put("s", "k3", &doc(serde_json::json!({"a": 99}))).unwrap();

    assert!(index.query_equal("__missing__").is_empty());
    let mut values = index.all_values();
    values.sort();
    assert_eq!(values, vec!["Alex", "Bob"]);
    for value in index.all_values() {
        assert!(!index.query_equal(&value).contains(&"k3".to_string()));
    }
}

#[test]
fn sortable_numeric_ordering() {
    let db = Database::new("shop", None);
    db.create_set("products").unwrap();
    let index = db
        .create_sortable_index("p", "products", "cat", vec!["price".to_string()])
        .unwrap();

    db.put("products", "p1", &doc(serde_json::json!({"cat": "E", "price": 1200})))
        .unwrap();
    db.put("products", "p2", &doc(serde_json::json!({"cat": "E", "price": 800})))
        .unwrap();
    db.put("products", "p3", &doc(serde_json::json!({"cat": "E", "price": 150})))
        .unwrap();

    let sortable = index.as_sortable().unwrap();
    assert_eq!(
        sortable.query_sorted("E", "price", true),
        vec!["p3", "p2", "p1"]
    );
    assert_eq!(
        sortable.query_sorted("E", "price", false),
        vec!["p1", "p2", "p3"]
    );
}

#[test]
fn pagination_covers_the_sequence_without_duplicates() {
    let db = Database::new("shop", None);
    db.create_set("products").unwrap();
    let index = db
        .create_sortable_index("p", "products", "cat", vec!["price".to_string()])
        .unwrap();

    for i in 0..20u32 {
        db.put(
            "products",
            &format!("p{i:02}"),
            &doc(serde_json::json!({"cat": "E", "price": (i + 1) * 10})),
        )
        .unwrap();
    }

    let sortable = index.as_sortable().unwrap();
    let full = sortable.query_sorted("E", "price", true);

    let mut pages = Vec::new();
    for offset in [0usize, 5, 10, 15] {
        let page = sortable.query_sorted_with_pagination("E", "price", true, offset, 5);
        assert_eq!(page.len(), 5);
        for key in &page {
            assert!(!pages.contains(key), "duplicate {key} across pages");
        }
        pages.extend(page);
    }
    assert_eq!(pages, full);
    assert!(sortable
        .query_sorted_with_pagination("E", "price", true, 20, 5)
        .is_empty());
}

#[test]
fn missing_sort_field_trails_in_both_directions() {
    let db = Database::new("shop", None);
    db.create_set("products").unwrap();
    let index = db
        .create_sortable_index("p", "products", "cat", vec!["price".to_string()])
        .unwrap();

    db.put("products", "a", &doc(serde_json::json!({"cat": "E", "price": 20})))
        .unwrap();
    db.put("products", "b", &doc(serde_json::json!({"cat": "E", "price": 10})))
        .unwrap();
    db.put("products", "c", &doc(serde_json::json!({"cat": "E"})))
        .unwrap();

    let sortable = index.as_sortable().unwrap();
    assert_eq!(sortable.query_sorted("E", "price", true), vec!["b", "a", "c"]);
    assert_eq!(
        sortable.query_sorted("E", "price", false),
        vec!["a", "b", "c"]
    );
}

#[test]
fn category_change_rebuckets() {
    let db = Database::new("shop", None);
    db.create_set("products").unwrap();
    let index = db
        .create_sortable_index("p", "products", "cat", vec!["price".to_string()])
        .unwrap();

    db.put("products", "p1", &doc(serde_json::json!({"cat": "E", "price": 100})))
        .unwrap();
    db.put("products", "p1", &doc(serde_json::json!({"cat": "C", "price": 100})))
        .unwrap();

    assert!(index.query_equal("E").is_empty());
    assert_eq!(index.query_equal("C"), vec!["p1"]);
}

#[test]
fn rebuild_is_history_independent() {
    let db = Database::new("d", None);
    db.create_set("s").unwrap();
    db.create_sortable_index("x", "s", "cat", vec!["rank".to_string()])
        .unwrap();

    // A churny history: inserts, updates, deletes
    for i in 0..30 {
        db.put(
            "s",
            &format!("k{i}"),
            &doc(serde_json::json!({"cat": "A", "rank": i})),
        )
        .unwrap();
    }
    for i in (0..30).step_by(3) {
        db.delete("s", &format!("k{i}")).unwrap();
    }
    for i in (1..30).step_by(3) {
        db.put(
            "s",
            &format!("k{i}"),
            &doc(serde_json::json!({"cat": "B", "rank": i})),
        )
        .unwrap();
    }

    let index = db.get_index("x").unwrap();
    let mut before_a = index.query_equal("A");
    let mut before_b = index.query_equal("B");

    db.rebuild_index("x").unwrap();

    let mut after_a = index.query_equal("A");
    let mut after_b = index.query_equal("B");
    before_a.sort();
    after_a.sort();
    before_b.sort();
    after_b.sort();
    assert_eq!(before_a, after_a);
    assert_eq!(before_b, after_b);

    for value in ["A", "B"] {
        assert_bucket_matches_scan(&db, "x", value);
    }
}

#[test]
fn fanout_covers_multiple_indexes_on_one_set() {
    let db = Database::new("d", None);
    db.create_set("s").unwrap();
    let by_name = db.create_basic_index("by_name", "s", "name").unwrap();
    let by_city = db
        .create_sortable_index("by_city", "s", "city", vec!["age".to_string()])
        .unwrap();

    db.put(
        "s",
        "k1",
        &doc(serde_json::json!({"name": "Ann", "city": "Oslo", "age": 40})),
    )
    .unwrap();
    db.put(
        "s",
        "k2",
        &doc(serde_json::json!({"name": "Ben", "city": "Oslo", "age": 31})),
    )
    .unwrap();

    assert_eq!(by_name.query_equal("Ann"), vec!["k1"]);
    assert_eq!(
        by_city.as_sortable().unwrap().query_sorted("Oslo", "age", true),
        vec!["k2", "k1"]
    );

    db.delete("s", "k1").unwrap();
    assert!(by_name.query_equal("Ann").is_empty());
    assert_eq!(by_city.query_equal("Oslo"), vec!["k2"]);
}

#[test]
fn concurrent_mutators_never_tear_buckets() {
    let manager = Arc::new(Manager::new());
    let db = manager.create_database("d", None).unwrap();
    db.create_set("s").unwrap();
    db.create_basic_index("i", "s", "group").unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let db = Arc::clone(&db);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("w{w}-k{i}");
                    db.put(
                        "s",
                        &key,
                        &doc(serde_json::json!({"group": format!("g{}", i % 5)})),
                    )
                    .unwrap();
                    if i % 7 == 0 {
                        db.delete("s", &key).unwrap();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let db = Arc::clone(&db);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let index = db.get_index("i").unwrap();
                    for g in 0..5 {
                        let bucket = index.query_equal(&format!("g{g}"));
                        // No key may appear twice inside one observed bucket
                        let mut sorted = bucket.clone();
                        sorted.sort();
                        sorted.dedup();
                        assert_eq!(sorted.len(), bucket.len(), "duplicated key in bucket");
                    }
                }
            })
        })
        .collect();

    for t in writers.into_iter().chain(readers) {
        t.join().unwrap();
    }

    // Quiescent check: every bucket equals what a scan would produce
    for g in 0..5 {
        assert_bucket_matches_scan(&db, "i", &format!("g{g}"));
    }
}

#[test]
fn manager_scopes_databases_independently() {
    let manager = Manager::new();
    let a = manager.create_database("a", None).unwrap();
    let b = manager.create_database("b", None).unwrap();

    a.create_set("s").unwrap();
    b.create_set("s").unwrap();
    a.put("s", "k", &doc(serde_json::json!({"v": 1}))).unwrap();

    assert!(a.get_set("s").unwrap().has("k"));
    assert!(!b.get_set("s").unwrap().has("k"));
}
