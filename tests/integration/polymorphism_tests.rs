//! Polymorphic relationship tests.
//!
//! A `property` owns "my stuff", which may be a tractor or a smartphone.

use jsonapi_graph::Request;
use serde_json::json;

use crate::common::{create, engine, error_title, new_resource, send};

fn property_with(stuff: serde_json::Value) -> String {
    new_resource("property", json!({}), json!({"myStuff": {"data": stuff}}))
}

/// The full tractor/smartphone/property scenario: create, read, include,
/// rebind, clear.
#[test]
fn test_tractor_smartphone_property_scenario() {
    let api = engine();
    let tractor = create(&api, "tractor", json!({"horsepower": 102})).expect("tractor should be created");
    let phone = create(&api, "smartphone", json!({"type": "android"})).expect("smartphone should be created");
    assert_eq!(tractor, "1");
    assert_eq!(phone, "1");

    let (status, body) =
        send(&api, Request::post("/property", property_with(json!({"type": "tractor", "id": "1"}))));
    assert_eq!(status, 201);
    assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!({"type": "tractor", "id": "1"}));

    let (status, body) = send(&api, Request::get("/property/1?include=myStuff"));
    assert_eq!(status, 200);
    assert_eq!(body["included"], json!([
        {"type": "tractor", "id": "1", "attributes": {"horsepower": 102}, "relationships": {}}
    ]));

    // Rebind to the smartphone
    let patch = json!({"data": {"type": "property", "id": "1", "relationships": {
        "myStuff": {"data": {"type": "smartphone", "id": "1"}}
    }}});
    let (status, body) = send(&api, Request::patch("/property/1", patch.to_string()));
    assert_eq!(status, 204);
    assert!(body.is_null());

    let (_, body) = send(&api, Request::get("/property/1?include=myStuff"));
    assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!({"type": "smartphone", "id": "1"}));
    assert_eq!(body["included"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["included"][0]["type"], json!("smartphone"));
    assert_eq!(body["included"][0]["attributes"]["type"], json!("android"));

    // Clear
    let clear = json!({"data": {"type": "property", "id": "1", "relationships": {"myStuff": {"data": null}}}});
    assert_eq!(send(&api, Request::patch("/property/1", clear.to_string())).0, 204);

    let (_, body) = send(&api, Request::get("/property/1?include=myStuff"));
    assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!(null));
    assert!(body.get("included").is_none());
}

/// Properties bound to different referent types list side by side.
#[test]
fn test_property_collection_lists_each_binding() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 102})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "android"})).expect("smartphone should be created");
    for stuff in [json!({"type": "tractor", "id": "1"}), json!({"type": "smartphone", "id": "1"})] {
        assert_eq!(send(&api, Request::post("/property", property_with(stuff))).0, 201);
    }

    let (status, body) = send(&api, Request::get("/property?include=myStuff"));
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"][0]["relationships"]["myStuff"]["data"], json!({"type": "tractor", "id": "1"}));
    assert_eq!(body["data"][1]["relationships"]["myStuff"]["data"], json!({"type": "smartphone", "id": "1"}));
    assert_eq!(body["included"].as_array().map(Vec::len), Some(2));
}

/// Binding to every permitted type reads back exactly `{type, id}`.
#[test]
fn test_bind_each_permitted_type() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "ios"})).expect("smartphone should be created");

    for (index, resource_type) in ["tractor", "smartphone"].into_iter().enumerate() {
        let linkage = json!({"type": resource_type, "id": "1"});
        let (status, _) = send(&api, Request::post("/property", property_with(linkage.clone())));
        assert_eq!(status, 201);

        let (_, body) = send(&api, Request::get(format!("/property/{}/relationships/myStuff", index + 1)));
        assert_eq!(body, json!({"data": linkage}));
    }
}

/// Rebinding leaves no trace of the previous referent.
#[test]
fn test_rebind_through_relationship_endpoint() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "ios"})).expect("smartphone should be created");
    send(&api, Request::post("/property", property_with(json!({"type": "tractor", "id": "1"}))));

    let rebind = json!({"data": {"type": "smartphone", "id": "1"}});
    let (status, _) = send(&api, Request::patch("/property/1/relationships/myStuff", rebind.to_string()));
    assert_eq!(status, 204);

    let (_, body) = send(&api, Request::get("/property/1/myStuff"));
    assert_eq!(body["data"]["type"], json!("smartphone"));
    assert_eq!(body["data"]["attributes"], json!({"type": "ios"}));

    let (_, body) = send(&api, Request::get("/property/1?include=myStuff"));
    let included = body["included"].as_array().cloned().unwrap_or_default();
    assert!(included.iter().all(|r| r["type"] != json!("tractor")));
}

/// Binding to a type outside the permitted set is a 400.
#[test]
fn test_unpermitted_type_is_rejected() {
    let api = engine();
    create(&api, "barn", json!({"name": "red"})).expect("barn should be created");

    let (status, body) = send(&api, Request::post("/property", property_with(json!({"type": "barn", "id": "1"}))));
    assert_eq!(status, 400);
    assert_eq!(error_title(&body), "Invalid relation type");
}

/// Linkage to a resource that does not exist is a 404 and nothing is stored.
#[test]
fn test_missing_referent_is_not_found() {
    let api = engine();
    let (status, _) = send(&api, Request::post("/property", property_with(json!({"type": "tractor", "id": "9"}))));
    assert_eq!(status, 404);

    let (_, body) = send(&api, Request::get("/property"));
    assert_eq!(body["data"], json!([]));
}

/// Ids are unique per type only, so linkage must carry the type.
#[test]
fn test_same_id_different_types() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    create(&api, "smartphone", json!({"type": "ios"})).expect("smartphone should be created");

    let things = json!({"data": {"type": "property", "relationships": {"things": {"data": [
        {"type": "tractor", "id": "1"}, {"type": "smartphone", "id": "1"}
    ]}}}});
    assert_eq!(send(&api, Request::post("/property", things.to_string())).0, 201);

    let (status, body) = send(&api, Request::get("/property/1/things"));
    assert_eq!(status, 200);
    let types: Vec<_> = body["data"].as_array().into_iter().flatten().map(|r| r["type"].clone()).collect();
    assert_eq!(types, vec![json!("tractor"), json!("smartphone")]);
}

/// Deleting a referent detaches every linkage to it.
#[test]
fn test_delete_detaches_linkage() {
    let api = engine();
    create(&api, "tractor", json!({"horsepower": 80})).expect("tractor should be created");
    send(&api, Request::post("/property", property_with(json!({"type": "tractor", "id": "1"}))));

    assert_eq!(send(&api, Request::delete("/tractor/1")).0, 204);
    assert_eq!(send(&api, Request::get("/tractor/1")).0, 404);

    let (_, body) = send(&api, Request::get("/property/1"));
    assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!(null));
}

/// A one-to-one pair stays in step from both sides.
#[test]
fn test_one_to_one_inverse() {
    let api = engine();
    create(&api, "oneToOneRoot", json!({"name": "left"})).expect("root should be created");

    let half = new_resource("oneToOneNonRoot", json!({"name": "right"}), json!({}));
    let (status, body) = send(&api, Request::post("/oneToOneRoot/1/otherHalf", half));
    assert_eq!(status, 201);
    assert_eq!(body["data"]["relationships"]["otherHalf"]["data"], json!({"type": "oneToOneRoot", "id": "1"}));

    let (_, body) = send(&api, Request::get("/oneToOneRoot/1?include=otherHalf"));
    assert_eq!(body["data"]["relationships"]["otherHalf"]["data"], json!({"type": "oneToOneNonRoot", "id": "1"}));
    assert_eq!(body["included"][0]["attributes"]["name"], json!("right"));

    let (status, body) = send(&api, Request::get("/oneToOneRoot/1/otherHalf/1/otherHalf"));
    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], json!("1"));
    assert_eq!(body["data"]["type"], json!("oneToOneRoot"));
}
