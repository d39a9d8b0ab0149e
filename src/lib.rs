//! # jsonapi-graph
//!
//! A permission-aware JSON:API resource engine with polymorphic
//! relationships.
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_graph::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> jsonapi_graph::Result<()> {
//! // Declare the types
//! let schema = SchemaRegistry::builder()
//!     .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
//!     .register(TypeSchema::new("smartphone").with_attribute("type", AttributeKind::String))
//!     .register(
//!         TypeSchema::new("property")
//!             .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"])),
//!     )
//!     .build()?;
//!
//! // Build the engine
//! let api = JsonApi::builder().schema(schema).build()?;
//!
//! // Create a tractor and a property pointing at it
//! api.handle(&Request::post(
//!     "/tractor",
//!     json!({"data": {"type": "tractor", "attributes": {"horsepower": 102}}}).to_string(),
//! ));
//! api.handle(&Request::post(
//!     "/property",
//!     json!({"data": {"type": "property", "relationships": {
//!         "myStuff": {"data": {"type": "tractor", "id": "1"}}
//!     }}})
//!     .to_string(),
//! ));
//!
//! // Read it back with the tractor side-loaded
//! let response = api.handle(&Request::get("/property/1?include=myStuff"));
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.into_body()["included"][0]["attributes"]["horsepower"], json!(102));
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! - **Polymorphic relationships**: a relationship may target a closed set of
//!   types; linkage always carries the concrete `{type, id}`.
//! - **Permissions as data**: every type and field carries a permission
//!   expression per action. Unreadable data is omitted, never leaked.
//! - **Capabilities**: types declare whether they can be filtered, sorted,
//!   or paginated. Unsupported requests are rejected with 400 before any
//!   data is read.
//! - **Transport-free**: [`JsonApi::handle`] maps a [`Request`] to a
//!   [`Response`]; sockets belong to the caller.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod config;
pub mod error;
pub mod permission;
pub mod schema;
pub mod types;

// Resource graph
pub mod graph;
pub mod query;
pub mod store;

// Documents and dispatch
pub mod document;
pub mod engine;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use config::{EngineConfig, IdStrategy, PaginationConfig};
pub use engine::{JsonApi, JsonApiBuilder, Method, Request, Response};
pub use error::{Error, ErrorKind, PermissionDenied, Result};
pub use types::{Principal, RelationshipValue, Resource, ResourceIdentifier};
