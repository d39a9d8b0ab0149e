//! Common test harness for jsonapi-graph integration tests.
//!
//! Provides the fixture schema and request helpers. The schema models:
//!
//! - `tractor`, `smartphone`: plain root types
//! - `property`: a polymorphic to-one (`myStuff`) and to-many (`things`)
//! - `oneToOneRoot` / `oneToOneNonRoot`: a one-to-one pair kept in step by
//!   inverses; the non-root half is only reachable through its owner
//! - `barn`: a type that supports no filtering, sorting, or pagination
//! - `document`: a type guarded by entity and field permissions

use std::sync::Once;

use anyhow::{Context, Result};
use jsonapi_graph::permission::{Action, CheckRegistry, HasRole, IsOwner};
use jsonapi_graph::schema::{AttributeKind, CapabilityDescriptor, RelationshipSchema, SchemaRegistry, TypeSchema};
use jsonapi_graph::types::Principal;
use jsonapi_graph::{EngineConfig, JsonApi, Request};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once. Honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The fixture schema.
pub fn schema() -> Result<SchemaRegistry> {
    let schema = SchemaRegistry::builder()
        .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
        .register(TypeSchema::new("smartphone").with_attribute("type", AttributeKind::String))
        .register(
            TypeSchema::new("property")
                .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"]))
                .with_relationship(RelationshipSchema::to_many_any("things", ["tractor", "smartphone"])),
        )
        .register(
            TypeSchema::new("oneToOneRoot")
                .with_attribute("name", AttributeKind::String)
                .with_relationship(
                    RelationshipSchema::to_one("otherHalf", "oneToOneNonRoot").with_inverse("otherHalf"),
                ),
        )
        .register(
            TypeSchema::new("oneToOneNonRoot")
                .with_root_level(false)
                .with_attribute("name", AttributeKind::String)
                .with_relationship(
                    RelationshipSchema::to_one("otherHalf", "oneToOneRoot").with_inverse("otherHalf"),
                ),
        )
        .register(
            TypeSchema::new("barn")
                .with_attribute("name", AttributeKind::String)
                .with_capabilities(CapabilityDescriptor::none())
                .with_relationship(RelationshipSchema::to_many("tractors", "tractor")),
        )
        .register(
            TypeSchema::new("document")
                .with_attribute("owner", AttributeKind::String)
                .with_attribute("title", AttributeKind::String)
                .with_attribute("secret", AttributeKind::String)
                .with_permission(Action::Read, "is owner OR is admin")
                .with_permission(Action::Create, "is authenticated")
                .with_permission(Action::Delete, "is admin")
                .with_field_permission("secret", Action::Read, "is admin")
                .with_field_permission("owner", Action::Update, "deny all"),
        )
        .build()?;
    Ok(schema)
}

/// Checks referenced by the fixture schema.
pub fn checks() -> CheckRegistry {
    CheckRegistry::new()
        .with_check("is owner", IsOwner::new("owner"))
        .with_check("is admin", HasRole("admin".into()))
        .with_check_fn("is authenticated", |principal, _| !principal.is_anonymous())
}

/// An engine over the fixture schema with default configuration.
pub fn engine() -> JsonApi {
    engine_with(EngineConfig::default())
}

/// An engine over the fixture schema.
pub fn engine_with(config: EngineConfig) -> JsonApi {
    init_tracing();
    let schema = schema().expect("fixture schema should be valid");
    JsonApi::builder()
        .schema(schema)
        .checks(checks())
        .config(config)
        .build()
        .expect("engine should build")
}

/// A plain user.
#[allow(dead_code)]
pub fn alice() -> Principal {
    Principal::user("alice")
}

/// A user holding the `admin` role.
#[allow(dead_code)]
pub fn admin() -> Principal {
    Principal::user("root").with_role("admin")
}

/// Sends a request, returning the status and body (`null` for 204).
pub fn send(api: &JsonApi, request: Request) -> (u16, Value) {
    let response = api.handle(&request);
    (response.status(), response.into_body())
}

/// A create document for `resource_type`.
#[allow(dead_code)]
pub fn new_resource(resource_type: &str, attributes: Value, relationships: Value) -> String {
    json!({"data": {"type": resource_type, "attributes": attributes, "relationships": relationships}})
        .to_string()
}

/// Creates a resource as `principal` at `path`, returning the created id.
#[allow(dead_code)]
pub fn create_as(api: &JsonApi, principal: Principal, path: &str, body: String) -> Result<String> {
    let (status, body) = send(api, Request::post(path, body).with_principal(principal));
    if status != 201 {
        anyhow::bail!("create at {} failed with status {}: {}", path, status, body);
    }
    let id = body["data"]["id"].as_str().context("created resource should carry an id")?;
    Ok(id.to_string())
}

/// Creates a resource anonymously at `/<type>`, returning the created id.
#[allow(dead_code)]
pub fn create(api: &JsonApi, resource_type: &str, attributes: Value) -> Result<String> {
    create_as(
        api,
        Principal::anonymous(),
        &format!("/{}", resource_type),
        new_resource(resource_type, attributes, json!({})),
    )
}

/// Returns the `status` of the first error in an error document.
#[allow(dead_code)]
pub fn error_status(body: &Value) -> &str {
    body["errors"][0]["status"].as_str().unwrap_or_default()
}

/// Returns the `title` of the first error in an error document.
#[allow(dead_code)]
pub fn error_title(body: &Value) -> &str {
    body["errors"][0]["title"].as_str().unwrap_or_default()
}
