//! Capability gate tests.
//!
//! `barn` declares itself non-filterable, non-sortable, and
//! non-paginatable; every such request against it is a 400.

use jsonapi_graph::Request;
use serde_json::json;
use test_case::test_case;

use crate::common::{create, engine, error_status, error_title, new_resource, send};

/// Filtering a non-filterable type fails regardless of the expression.
#[test_case("name==red")]
#[test_case("name!=red")]
#[test_case("id=in=(1,2)")]
#[test_case("no_such_field==x")]
#[test_case("(((")]
fn test_filter_on_non_filterable_type(expression: &str) {
    let api = engine();
    create(&api, "barn", json!({"name": "red"})).expect("barn should be created");

    for path in [format!("/barn?filter[barn]={}", expression), format!("/barn?filter={}", expression)] {
        let (status, body) = send(&api, Request::get(&path));
        assert_eq!(status, 400, "{}", path);
        assert_eq!(error_title(&body), "Unsupported operation", "{}", path);
    }
}

#[test_case("/barn?sort=name")]
#[test_case("/barn?page[size]=1")]
#[test_case("/barn?page[totals]")]
#[test_case("/property?filter[barn]=name==red")]
fn test_unsupported_operations(path: &str) {
    let api = engine();
    let (status, body) = send(&api, Request::get(path));
    assert_eq!(status, 400);
    assert_eq!(error_title(&body), "Unsupported operation");
}

/// The gate runs before the addressed resource is looked up.
#[test]
fn test_capability_beats_not_found() {
    let api = engine();
    let (status, body) = send(&api, Request::get("/barn/42?filter[barn]=name==red"));
    assert_eq!(status, 400);
    assert_eq!(error_status(&body), "400");

    let (status, _) = send(&api, Request::get("/barn/42"));
    assert_eq!(status, 404);
}

/// A non-paginatable type lists everything, without `meta`.
#[test]
fn test_non_paginatable_collection_is_unwindowed() {
    let api = engine();
    for name in ["red", "blue", "green"] {
        create(&api, "barn", json!({"name": name})).expect("barn should be created");
    }
    let (status, body) = send(&api, Request::get("/barn"));
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
    assert!(body.get("meta").is_none());
}

/// Filterable types accept filters on the primary collection and on
/// to-many sub-collections.
#[test]
fn test_filter_on_filterable_types() {
    let api = engine();
    for horsepower in [80, 120, 200] {
        create(&api, "tractor", json!({"horsepower": horsepower})).expect("tractor should be created");
    }

    let (status, body) = send(&api, Request::get("/tractor?filter=horsepower=ge=120;horsepower=lt=200"));
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["id"], json!("2"));

    let things = json!({"data": {"type": "property", "relationships": {"things": {"data": [
        {"type": "tractor", "id": "1"}, {"type": "tractor", "id": "3"}
    ]}}}});
    assert_eq!(send(&api, Request::post("/property", things.to_string())).0, 201);

    let (status, body) = send(&api, Request::get("/property/1/things?filter[tractor]=horsepower=gt=100"));
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([
        {"type": "tractor", "id": "3", "attributes": {"horsepower": 200}, "relationships": {}}
    ]));
}

#[test_case("/tractor?filter=colour==red")]
#[test_case("/tractor?filter[boat]=id==1")]
#[test_case("/tractor?sort=colour")]
#[test_case("/property?include=nothing")]
#[test_case("/tractor?fields[tractor]=colour")]
#[test_case("/tractor?unknown=1")]
fn test_invalid_query_parameters(path: &str) {
    let api = engine();
    let (status, body) = send(&api, Request::get(path));
    assert_eq!(status, 400);
    assert_eq!(error_title(&body), "Invalid argument");
}

/// Oversized or deeply nested query values fail with a 400 instead of
/// being evaluated.
#[test_case(format!("/tractor?filter={}horsepower==102{}", "(".repeat(20_000), ")".repeat(20_000)) ; "flood of parentheses")]
#[test_case(format!("/tractor?filter={}horsepower==102{}", "(".repeat(64), ")".repeat(64)) ; "nesting past the limit")]
#[test_case(format!("/tractor?filter=horsepower=in=({})", vec!["1"; 5_000].join(",")) ; "overlong filter")]
#[test_case(format!("/property?include={}", vec!["myStuff"; 10_000].join(".")) ; "overlong include path")]
#[test_case(format!("/tractor?sort={}wheels", "horsepower,".repeat(10_000)) ; "overlong sort list")]
fn test_hostile_query_values_are_rejected(path: String) {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 102})).expect("tractor should be created");
    let (status, body) = send(&api, Request::get(&path));
    assert_eq!(status, 400);
    assert_eq!(error_title(&body), "Invalid argument");
}

/// A long but valid include path over a cycle is walked level by level.
#[test]
fn test_long_cyclic_include_path() {
    let api = engine();
    create(&api, "oneToOneRoot", json!({"name": "left"})).expect("root should be created");
    let half = new_resource("oneToOneNonRoot", json!({"name": "right"}), json!({}));
    assert_eq!(send(&api, Request::post("/oneToOneRoot/1/otherHalf", half)).0, 201);

    let path = format!("/oneToOneRoot/1?include={}", vec!["otherHalf"; 2_000].join("."));
    let (status, body) = send(&api, Request::get(&path));
    assert_eq!(status, 200);
    assert_eq!(body["included"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["included"][0]["type"], json!("oneToOneNonRoot"));
}
