//! Core types for the engine.
//!
//! - [`ResourceIdentifier`]: the `(type, id)` pair naming a resource
//! - [`Resource`]: a snapshot of one resource
//! - [`RelationshipValue`]: the linkage held in one relationship slot
//! - [`Principal`]: the caller an operation runs for

mod principal;
mod relationship;
mod resource;

pub use principal::Principal;
pub use relationship::RelationshipValue;
pub use resource::{Attributes, ParseError, Relationships, Resource, ResourceIdentifier};
