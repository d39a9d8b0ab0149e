//! Request dispatch.
//!
//! [`JsonApi`] ties the schema, permission evaluator, store, and serializer
//! together behind one call: [`JsonApi::handle`] turns a [`Request`] into a
//! [`Response`]. It never opens sockets; a transport adapter owns that.
//!
//! ## Example
//!
//! ```rust
//! use jsonapi_graph::{JsonApi, Request};
//! use jsonapi_graph::schema::{AttributeKind, RelationshipSchema, SchemaRegistry, TypeSchema};
//! use serde_json::json;
//!
//! let schema = SchemaRegistry::builder()
//!     .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
//!     .register(
//!         TypeSchema::new("property")
//!             .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor"])),
//!     )
//!     .build()
//!     .unwrap();
//! let api = JsonApi::builder().schema(schema).build().unwrap();
//!
//! let created = api.handle(&Request::post(
//!     "/tractor",
//!     json!({"data": {"type": "tractor", "attributes": {"horsepower": 102}}}).to_string(),
//! ));
//! assert_eq!(created.status(), 201);
//!
//! let fetched = api.handle(&Request::get("/tractor/1"));
//! assert_eq!(fetched.into_body()["data"]["attributes"]["horsepower"], json!(102));
//! ```

mod builder;
mod dispatch;
mod request;
mod response;
mod route;

use std::sync::Arc;

pub use builder::{HasSchema, JsonApiBuilder, NoSchema};
pub use request::{Method, Request};
pub use response::Response;

use crate::config::EngineConfig;
use crate::permission::PermissionEvaluator;
use crate::schema::SchemaRegistry;
use crate::store::DataStore;

/// The JSON:API engine.
///
/// `JsonApi` is `Send + Sync`; share it across threads with an `Arc`.
pub struct JsonApi {
    schema: Arc<SchemaRegistry>,
    permissions: PermissionEvaluator,
    store: Arc<dyn DataStore>,
    config: EngineConfig,
}

impl JsonApi {
    /// Creates a new engine builder.
    pub fn builder() -> JsonApiBuilder<NoSchema> {
        JsonApiBuilder::new()
    }

    /// Handles one request.
    ///
    /// Failures are rendered as JSON:API error documents; this never panics
    /// on client input.
    pub fn handle(&self, request: &Request) -> Response {
        let response = match self.dispatch(request) {
            Ok(response) => response,
            Err(error) => {
                if !error.kind().is_client_error() {
                    tracing::warn!(
                        method = %request.method(),
                        path = request.path(),
                        error = %error,
                        "request failed"
                    );
                }
                Response::from_error(&error)
            },
        };
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status(),
            "request handled"
        );
        response
    }

    /// Returns the schema registry.
    #[inline]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Returns the store.
    #[inline]
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for JsonApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonApi")
            .field("types", &self.schema.len())
            .field("rules", &self.permissions.rule_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
