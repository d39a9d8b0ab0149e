//! Write payloads accepted by a [`DataStore`](super::DataStore).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::{Attributes, RelationshipValue, ResourceIdentifier};

/// A change to one relationship slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageChange {
    /// Replace the whole linkage. `ToOne(None)` clears a to-one slot.
    Replace(RelationshipValue),
    /// Append referents to a to-many linkage, skipping ones already present.
    Add(Vec<ResourceIdentifier>),
    /// Remove referents from a to-many linkage.
    Remove(Vec<ResourceIdentifier>),
}

/// A partial update of one resource.
///
/// Only the attributes and relationships present in the patch change; a
/// `null` attribute value clears that attribute. A store applies a patch
/// entirely or not at all.
///
/// ```rust
/// use jsonapi_graph::store::{LinkageChange, ResourcePatch};
/// use jsonapi_graph::types::{RelationshipValue, ResourceIdentifier};
///
/// let patch = ResourcePatch::new(ResourceIdentifier::new("property", "1"))
///     .with_attribute("owner", "alice")
///     .with_linkage("myStuff", LinkageChange::Replace(RelationshipValue::empty_to_one()));
///
/// assert!(!patch.is_empty());
/// assert_eq!(patch.linkages().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePatch {
    identifier: ResourceIdentifier,
    attributes: Attributes,
    linkages: BTreeMap<String, LinkageChange>,
}

impl ResourcePatch {
    /// An empty patch of `identifier`.
    pub fn new(identifier: ResourceIdentifier) -> Self {
        Self { identifier, attributes: Attributes::new(), linkages: BTreeMap::new() }
    }

    /// Sets an attribute (builder style).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Sets a linkage change (builder style).
    #[must_use]
    pub fn with_linkage(mut self, name: impl Into<String>, change: LinkageChange) -> Self {
        self.set_linkage(name, change);
        self
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Sets a linkage change, replacing any earlier change to the same slot.
    pub fn set_linkage(&mut self, name: impl Into<String>, change: LinkageChange) {
        self.linkages.insert(name.into(), change);
    }

    /// Returns the patched resource.
    pub fn identifier(&self) -> &ResourceIdentifier {
        &self.identifier
    }

    /// Returns the attribute changes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Iterates over relationship changes.
    pub fn linkages(&self) -> impl Iterator<Item = (&str, &LinkageChange)> {
        self.linkages.iter().map(|(name, change)| (name.as_str(), change))
    }

    /// Iterates over every touched field name.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().chain(self.linkages.keys()).map(String::as_str)
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.linkages.is_empty()
    }
}

/// Links a newly created resource into an existing relationship.
///
/// Used when a resource is created through a relationship path such as
/// `POST /oneToOneRoot/1/otherObject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    owner: ResourceIdentifier,
    relation: String,
}

impl Attachment {
    /// Attaches to `relation` on `owner`.
    pub fn new(owner: ResourceIdentifier, relation: impl Into<String>) -> Self {
        Self { owner, relation: relation.into() }
    }

    /// Returns the owning resource.
    pub fn owner(&self) -> &ResourceIdentifier {
        &self.owner
    }

    /// Returns the relationship name on the owner.
    pub fn relation(&self) -> &str {
        &self.relation
    }
}
