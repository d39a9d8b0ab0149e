//! Routing tests: paths, methods, and relationship endpoints.

use jsonapi_graph::{Method, Request};
use serde_json::json;
use test_case::test_case;

use crate::common::{create, engine, error_title, new_resource, send};

#[test_case(Method::Patch, "/tractor")]
#[test_case(Method::Delete, "/tractor")]
#[test_case(Method::Post, "/tractor/1")]
#[test_case(Method::Patch, "/property/1/myStuff")]
#[test_case(Method::Post, "/property/1/relationships/myStuff")]
#[test_case(Method::Delete, "/property/1/relationships/myStuff")]
fn test_method_not_allowed(method: Method, path: &str) {
    let api = engine();
    let (status, body) = send(&api, Request::new(method, path).with_body("{}"));
    assert_eq!(status, 405);
    assert_eq!(error_title(&body), "Method not allowed");
}

#[test_case("/")]
#[test_case("/boat")]
#[test_case("/tractor/1")]
#[test_case("/oneToOneNonRoot")]
#[test_case("/oneToOneNonRoot/1")]
#[test_case("/property/1/wheels")]
fn test_not_found(path: &str) {
    let api = engine();
    let (status, body) = send(&api, Request::get(path));
    assert_eq!(status, 404);
    assert_eq!(error_title(&body), "Not found");
}

/// Creating a non-root type at the root is not possible.
#[test]
fn test_non_root_create_at_root() {
    let api = engine();
    let half = new_resource("oneToOneNonRoot", json!({"name": "right"}), json!({}));
    let (status, _) = send(&api, Request::post("/oneToOneNonRoot", half));
    assert_eq!(status, 404);
}

/// To-many relationship endpoints add and remove members.
#[test]
fn test_to_many_relationship_endpoint() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "ios"})).expect("smartphone should be created");
    create(&api, "property", json!({})).expect("property should be created");

    let members = json!({"data": [{"type": "tractor", "id": "1"}, {"type": "smartphone", "id": "1"}]});
    let (status, _) = send(&api, Request::post("/property/1/relationships/things", members.to_string()));
    assert_eq!(status, 204);

    let (_, body) = send(&api, Request::get("/property/1/relationships/things"));
    assert_eq!(body, json!({"data": [{"type": "tractor", "id": "1"}, {"type": "smartphone", "id": "1"}]}));

    let remove = json!({"data": [{"type": "tractor", "id": "1"}]});
    let (status, _) = send(&api, Request::delete("/property/1/relationships/things").with_body(remove.to_string()));
    assert_eq!(status, 204);

    let (_, body) = send(&api, Request::get("/property/1/relationships/things"));
    assert_eq!(body, json!({"data": [{"type": "smartphone", "id": "1"}]}));
}

/// A member of a to-many relationship is addressable by id.
#[test]
fn test_nested_member_path() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    let barn = new_resource("barn", json!({"name": "red"}), json!({"tractors": {"data": [{"type": "tractor", "id": "1"}]}}));
    assert_eq!(send(&api, Request::post("/barn", barn)).0, 201);

    let (status, body) = send(&api, Request::get("/barn/1/tractors/1"));
    assert_eq!(status, 200);
    assert_eq!(body["data"]["attributes"]["horsepower"], json!(80));

    let (status, _) = send(&api, Request::get("/barn/1/tractors/2"));
    assert_eq!(status, 404);
}

/// Updates must name the addressed resource and type.
#[test]
fn test_update_body_must_match_path() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");

    let wrong_id = json!({"data": {"type": "tractor", "id": "2", "attributes": {"horsepower": 90}}});
    assert_eq!(send(&api, Request::patch("/tractor/1", wrong_id.to_string())).0, 400);

    let wrong_type = json!({"data": {"type": "smartphone", "id": "1"}});
    let (status, body) = send(&api, Request::patch("/tractor/1", wrong_type.to_string()));
    assert_eq!(status, 400);
    assert_eq!(body["errors"][0]["source"]["pointer"], json!("/data/type"));

    let (status, body) = send(&api, Request::new(Method::Patch, "/tractor/1"));
    assert_eq!(status, 400);
    assert_eq!(error_title(&body), "Invalid document");
}

/// Client-supplied ids on create are ignored.
#[test]
fn test_client_id_ignored() {
    let api = engine();
    let body = json!({"data": {"type": "tractor", "id": "99", "attributes": {"horsepower": 1}}});
    let (status, body) = send(&api, Request::post("/tractor", body.to_string()));
    assert_eq!(status, 201);
    assert_eq!(body["data"]["id"], json!("1"));
}

/// Path segments are percent-decoded.
#[test]
fn test_encoded_path_segments() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 1})).expect("tractor should be created");
    let (status, _) = send(&api, Request::get("/%74ractor/%31"));
    assert_eq!(status, 200);
}

/// Sparse fieldsets trim attributes and relationships.
#[test]
fn test_sparse_fieldsets() {
    let api = engine();
    create(&api, "oneToOneRoot", json!({"name": "left"})).expect("root should be created");
    let (_, body) = send(&api, Request::get("/oneToOneRoot/1?fields[oneToOneRoot]=name"));
    assert_eq!(body["data"]["attributes"], json!({"name": "left"}));
    assert_eq!(body["data"]["relationships"], json!({}));
}
