//! Pagination and totals tests.

use jsonapi_graph::{EngineConfig, PaginationConfig, Request};
use serde_json::json;
use test_case::test_case;

use crate::common::{create, engine, engine_with, error_status, send};

fn seed_tractors(api: &jsonapi_graph::JsonApi, count: i64) {
    for horsepower in 1..=count {
        create(api, "tractor", json!({"horsepower": horsepower * 10})).expect("tractor should be created");
    }
}

/// `page[totals]` yields `meta.page` with a positive record count.
#[test]
fn test_totals_on_request() {
    let api = engine();
    seed_tractors(&api, 5);

    let (status, body) = send(&api, Request::get("/tractor?page[size]=2&page[totals]"));
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["meta"]["page"], json!({"number": 1, "limit": 2, "totalPages": 3, "totalRecords": 5}));
}

/// Without `page[totals]` there is no `meta`.
#[test]
fn test_no_meta_without_totals() {
    let api = engine();
    seed_tractors(&api, 3);

    let (_, body) = send(&api, Request::get("/tractor?page[size]=2"));
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert!(body.get("meta").is_none());
}

/// Single-entity responses never carry `meta`, even when asked.
#[test]
fn test_single_resource_never_has_meta() {
    let api = engine();
    seed_tractors(&api, 1);
    create(&api, "property", json!({})).expect("property should be created");
    let link = json!({"data": {"type": "tractor", "id": "1"}});
    send(&api, Request::patch("/property/1/relationships/myStuff", link.to_string()));

    for path in ["/tractor/1?page[totals]", "/property/1/myStuff?page[totals]", "/property/1?page[size]=1"] {
        let (status, body) = send(&api, Request::get(path));
        assert_eq!(status, 200, "{}", path);
        assert!(body.get("meta").is_none(), "{}", path);
    }
}

/// Offset/limit windows and page numbers address the same rows.
#[test]
fn test_offset_and_number_agree() {
    let api = engine();
    seed_tractors(&api, 6);

    let (_, by_number) = send(&api, Request::get("/tractor?page[number]=2&page[size]=2"));
    let (_, by_offset) = send(&api, Request::get("/tractor?page[offset]=2&page[limit]=2"));
    assert_eq!(by_number["data"], by_offset["data"]);
    let ids: Vec<_> = by_number["data"].as_array().into_iter().flatten().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("3"), json!("4")]);
}

/// Sorting happens before the window is cut.
#[test]
fn test_sort_then_page() {
    let api = engine();
    seed_tractors(&api, 4);

    let (_, body) = send(&api, Request::get("/tractor?sort=-horsepower&page[limit]=2"));
    let power: Vec<_> =
        body["data"].as_array().into_iter().flatten().map(|r| r["attributes"]["horsepower"].clone()).collect();
    assert_eq!(power, vec![json!(40), json!(30)]);
}

/// Totals count the filtered collection, not the whole table.
#[test]
fn test_totals_follow_filter() {
    let api = engine();
    seed_tractors(&api, 5);

    let (_, body) = send(&api, Request::get("/tractor?filter[tractor]=horsepower=gt=20&page[totals]"));
    assert_eq!(body["meta"]["page"]["totalRecords"], json!(3));
}

/// Collections are always windowed, by the configured default.
#[test]
fn test_default_page_size_applies() {
    let config = EngineConfig::builder()
        .pagination(PaginationConfig::builder().default_page_size(2).max_page_size(3).build())
        .build();
    let api = engine_with(config);
    seed_tractors(&api, 4);

    let (_, body) = send(&api, Request::get("/tractor"));
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = send(&api, Request::get("/tractor?page[size]=4"));
    assert_eq!(status, 400);
    assert_eq!(error_status(&body), "400");
}

/// `always_page_meta` adds totals to every windowed collection.
#[test]
fn test_always_page_meta() {
    let api = engine_with(EngineConfig::builder().always_page_meta(true).build());
    seed_tractors(&api, 2);

    let (_, body) = send(&api, Request::get("/tractor"));
    assert_eq!(body["meta"]["page"]["totalRecords"], json!(2));

    let (_, body) = send(&api, Request::get("/tractor/1"));
    assert!(body.get("meta").is_none());
}

#[test_case("page[size]=0")]
#[test_case("page[size]=abc")]
#[test_case("page[number]=-1")]
#[test_case("page[number]=1&page[offset]=0")]
#[test_case("page[bogus]=1")]
fn test_invalid_page_parameters(query: &str) {
    let api = engine();
    let (status, _) = send(&api, Request::get(format!("/tractor?{}", query)));
    assert_eq!(status, 400);
}
