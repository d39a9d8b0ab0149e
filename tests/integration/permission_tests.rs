//! Permission tests against the `document` type.
//!
//! - read: owner or admin; `secret` is admin-only
//! - create: any authenticated principal
//! - update: anyone, but `owner` can never change
//! - delete: admin only

use jsonapi_graph::Request;
use jsonapi_graph::types::Principal;
use serde_json::json;

use crate::common::{admin, alice, create_as, engine, error_title, new_resource, send};

fn document(owner: &str, title: &str) -> String {
    new_resource("document", json!({"owner": owner, "title": title, "secret": "s3cret"}), json!({}))
}

fn seed(api: &jsonapi_graph::JsonApi) {
    create_as(api, alice(), "/document", document("alice", "alpha")).expect("alice's document should be created");
    create_as(api, Principal::user("bob"), "/document", document("bob", "beta"))
        .expect("bob's document should be created");
}

/// Anonymous principals cannot create documents.
#[test]
fn test_create_denied() {
    let api = engine();
    let (status, body) = send(&api, Request::post("/document", document("alice", "alpha")));
    assert_eq!(status, 403);
    assert_eq!(error_title(&body), "Forbidden");
    assert_eq!(send(&api, Request::get("/document").with_principal(admin())).1["data"], json!([]));
}

/// Direct fetch of an unreadable entity is a 403.
#[test]
fn test_direct_fetch_denied() {
    let api = engine();
    seed(&api);

    let (status, _) = send(&api, Request::get("/document/2").with_principal(alice()));
    assert_eq!(status, 403);
    let (status, _) = send(&api, Request::get("/document/2").with_principal(admin()));
    assert_eq!(status, 200);
}

/// Unreadable rows are hidden from collections and from totals.
#[test]
fn test_collection_hides_unreadable_rows() {
    let api = engine();
    seed(&api);

    let (status, body) = send(&api, Request::get("/document?page[totals]").with_principal(alice()));
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["attributes"]["title"], json!("alpha"));
    assert_eq!(body["meta"]["page"]["totalRecords"], json!(1));

    let (_, body) = send(&api, Request::get("/document?page[totals]").with_principal(admin()));
    assert_eq!(body["meta"]["page"]["totalRecords"], json!(2));
}

/// Unreadable fields are omitted from output.
#[test]
fn test_unreadable_field_is_omitted() {
    let api = engine();
    seed(&api);

    let (_, body) = send(&api, Request::get("/document/1").with_principal(alice()));
    assert_eq!(body["data"]["attributes"], json!({"owner": "alice", "title": "alpha"}));

    let (_, body) = send(&api, Request::get("/document/1").with_principal(admin()));
    assert_eq!(body["data"]["attributes"]["secret"], json!("s3cret"));
}

/// Filtering or sorting on an unreadable field is a 403.
#[test]
fn test_query_on_unreadable_field_denied() {
    let api = engine();
    seed(&api);

    for path in ["/document?filter=secret==s3cret", "/document?sort=secret"] {
        let (status, _) = send(&api, Request::get(path).with_principal(alice()));
        assert_eq!(status, 403, "{}", path);
        let (status, _) = send(&api, Request::get(path).with_principal(admin()));
        assert_eq!(status, 200, "{}", path);
    }

    let (status, _) = send(&api, Request::get("/document?sort=-title").with_principal(alice()));
    assert_eq!(status, 200);
}

/// A denied field in an update rejects the whole patch.
#[test]
fn test_update_is_all_or_nothing() {
    let api = engine();
    seed(&api);

    let patch = json!({"data": {"type": "document", "id": "1", "attributes": {"title": "gamma", "owner": "bob"}}});
    let (status, _) = send(&api, Request::patch("/document/1", patch.to_string()).with_principal(alice()));
    assert_eq!(status, 403);

    let (_, body) = send(&api, Request::get("/document/1").with_principal(alice()));
    assert_eq!(body["data"]["attributes"]["title"], json!("alpha"));

    let patch = json!({"data": {"type": "document", "id": "1", "attributes": {"title": "gamma"}}});
    let (status, _) = send(&api, Request::patch("/document/1", patch.to_string()).with_principal(alice()));
    assert_eq!(status, 204);
}

/// Only admins delete.
#[test]
fn test_delete_requires_admin() {
    let api = engine();
    seed(&api);

    let (status, _) = send(&api, Request::delete("/document/1").with_principal(alice()));
    assert_eq!(status, 403);
    let (status, _) = send(&api, Request::delete("/document/1").with_principal(admin()));
    assert_eq!(status, 204);
    let (status, _) = send(&api, Request::get("/document/1").with_principal(admin()));
    assert_eq!(status, 404);
}
