//! Prelude module for convenient imports.
//!
//! ```rust
//! use jsonapi_graph::prelude::*;
//! ```
//!
//! This provides access to:
//! - The engine and its request/response types
//! - Schema declaration types
//! - Permission checks
//! - Error types

pub use crate::{
    config::{EngineConfig, IdStrategy, PaginationConfig},
    engine::{JsonApi, JsonApiBuilder, Method, Request, Response},
    error::{Error, ErrorKind, PermissionDenied, Result},
    permission::{Action, Check, CheckRegistry, HasRole, IsOwner, Target},
    schema::{AttributeKind, CapabilityDescriptor, RelationshipSchema, SchemaRegistry, TypeSchema},
    store::{DataStore, InMemoryStore},
    types::{Principal, RelationshipValue, Resource, ResourceIdentifier},
};
