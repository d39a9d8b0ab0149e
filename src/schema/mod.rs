//! Schema declarations: types, attributes, relationships, capabilities.
//!
//! The schema is configuration. It is declared once at startup, validated
//! by [`SchemaRegistryBuilder::build`], and read-only afterwards.

mod attribute;
mod capability;
mod registry;
mod relationship;

pub use attribute::AttributeKind;
pub use capability::CapabilityDescriptor;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder, TypeSchema};
pub use relationship::{Cardinality, RelationshipSchema};
