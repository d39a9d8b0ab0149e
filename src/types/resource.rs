//! Resource identity and resource snapshots.
//!
//! A resource is addressed by `(type, id)`. Ids are unique within a type
//! only: `tractor/1` and `smartphone/1` are different resources.
//!
//! ```rust
//! use jsonapi_graph::types::ResourceIdentifier;
//!
//! let tractor = ResourceIdentifier::new("tractor", "1");
//! let phone = ResourceIdentifier::new("smartphone", "1");
//! assert_ne!(tractor, phone);
//! assert_eq!(tractor.to_string(), "tractor/1");
//!
//! let parsed: ResourceIdentifier = "smartphone/1".parse().unwrap();
//! assert_eq!(parsed, phone);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RelationshipValue;

/// Attribute map of a resource.
pub type Attributes = BTreeMap<String, Value>;

/// Relationship map of a resource.
pub type Relationships = BTreeMap<String, RelationshipValue>;

/// Error parsing a resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Missing slash separator between type and id.
    #[error("missing '/' separator in resource identifier")]
    MissingSeparator,
    /// Empty resource type.
    #[error("empty resource type")]
    EmptyType,
    /// Empty resource id.
    #[error("empty resource id")]
    EmptyId,
}

/// The `(type, id)` pair naming one resource.
///
/// Serializes as the JSON:API resource identifier object `{"type": .., "id": ..}`.
/// This is the tag of a polymorphic linkage: the type name decides which
/// table the id is looked up in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    resource_type: String,
    id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier from type and id components.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self { resource_type: resource_type.into(), id: id.into() }
    }

    /// Returns the resource type.
    #[inline]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the resource id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

impl FromStr for ResourceIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource_type, id) = s.split_once('/').ok_or(ParseError::MissingSeparator)?;
        if resource_type.is_empty() {
            return Err(ParseError::EmptyType);
        }
        if id.is_empty() {
            return Err(ParseError::EmptyId);
        }
        Ok(Self::new(resource_type, id))
    }
}

/// A snapshot of one resource: identity, attributes, and relationship linkage.
///
/// Snapshots are values. Reading a resource from the store clones it out
/// under the store lock, so a snapshot never changes underneath its holder.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    identifier: ResourceIdentifier,
    attributes: Attributes,
    relationships: Relationships,
}

impl Resource {
    /// Creates a resource with no attributes or relationships.
    pub fn new(identifier: ResourceIdentifier) -> Self {
        Self { identifier, attributes: Attributes::new(), relationships: Relationships::new() }
    }

    /// Sets an attribute value (builder style).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets a relationship value (builder style).
    #[must_use]
    pub fn with_relationship(mut self, name: impl Into<String>, value: RelationshipValue) -> Self {
        self.relationships.insert(name.into(), value);
        self
    }

    /// Returns the identifier.
    #[inline]
    pub fn identifier(&self) -> &ResourceIdentifier {
        &self.identifier
    }

    /// Returns the resource type.
    #[inline]
    pub fn resource_type(&self) -> &str {
        self.identifier.resource_type()
    }

    /// Returns the resource id.
    #[inline]
    pub fn id(&self) -> &str {
        self.identifier.id()
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns a relationship value.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipValue> {
        self.relationships.get(name)
    }

    /// Returns all relationships.
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub(crate) fn assign_id(&mut self, id: impl Into<String>) {
        self.identifier.id = id.into();
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub(crate) fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }
}
