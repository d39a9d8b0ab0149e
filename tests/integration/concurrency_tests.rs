//! Concurrent access tests.
//!
//! The engine is shared across tasks behind an `Arc`; readers racing a
//! writer must never observe a torn `(type, id)` linkage.

use std::sync::Arc;

use jsonapi_graph::Request;
use serde_json::{Value, json};

use crate::common::{create, engine, new_resource, send};

fn rebind(resource_type: &str) -> String {
    json!({"data": {"type": resource_type, "id": "1"}}).to_string()
}

/// Readers see the property bound to exactly one of the two referents.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rebind_and_read() {
    let api = Arc::new(engine());
    create(&api, "tractor", json!({"horsepower": 102})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "android"})).expect("smartphone should be created");
    let property = new_resource("property", json!({}), json!({"myStuff": {"data": {"type": "tractor", "id": "1"}}}));
    assert_eq!(send(&api, Request::post("/property", property)).0, 201);

    let writer = {
        let api = Arc::clone(&api);
        tokio::task::spawn_blocking(move || {
            for round in 0..200 {
                let target = if round % 2 == 0 { "smartphone" } else { "tractor" };
                let (status, _) = send(&api, Request::patch("/property/1/relationships/myStuff", rebind(target)));
                assert_eq!(status, 204);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let api = Arc::clone(&api);
            tokio::task::spawn_blocking(move || {
                for _ in 0..200 {
                    let (status, body) = send(&api, Request::get("/property/1?include=myStuff"));
                    assert_eq!(status, 200);
                    let linkage = &body["data"]["relationships"]["myStuff"]["data"];
                    assert!(
                        *linkage == json!({"type": "tractor", "id": "1"})
                            || *linkage == json!({"type": "smartphone", "id": "1"}),
                        "torn linkage: {}",
                        linkage
                    );
                    let included: Vec<Value> = body["included"].as_array().cloned().unwrap_or_default();
                    assert_eq!(included.len(), 1);
                    assert_eq!(included[0]["type"], linkage["type"]);
                }
            })
        })
        .collect();

    writer.await.expect("writer should finish");
    for reader in readers {
        reader.await.expect("reader should finish");
    }
}

/// Concurrent creates never hand out the same id twice.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_ids() {
    let api = Arc::new(engine());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let api = Arc::clone(&api);
            tokio::task::spawn_blocking(move || {
                (0..25)
                    .map(|_| create(&api, "tractor", json!({"horsepower": 1})).expect("tractor should be created"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.extend(task.await.expect("task should finish"));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 200);

    let (_, body) = send(&api, Request::get("/tractor?page[totals]"));
    assert_eq!(body["meta"]["page"]["totalRecords"], json!(200));
}
