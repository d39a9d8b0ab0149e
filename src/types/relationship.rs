//! Relationship linkage held by a resource.

use serde::{Deserialize, Serialize};

use super::ResourceIdentifier;

/// The current linkage of one relationship.
///
/// A to-one slot is either empty or bound to exactly one referent. Binding a
/// new referent replaces the old one whole; the `(type, id)` pair is never
/// split across two writes.
///
/// ```rust
/// use jsonapi_graph::types::{RelationshipValue, ResourceIdentifier};
///
/// let mut slot = RelationshipValue::empty_to_one();
/// assert!(slot.is_empty());
///
/// slot = RelationshipValue::to_one(ResourceIdentifier::new("tractor", "1"));
/// assert_eq!(slot.as_to_one().unwrap().unwrap().resource_type(), "tractor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipValue {
    /// A to-one relationship: empty or bound.
    ToOne(Option<ResourceIdentifier>),

    /// A to-many relationship: an ordered set of referents.
    ToMany(Vec<ResourceIdentifier>),
}

impl RelationshipValue {
    /// An empty to-one slot.
    pub fn empty_to_one() -> Self {
        RelationshipValue::ToOne(None)
    }

    /// A to-one slot bound to `target`.
    pub fn to_one(target: ResourceIdentifier) -> Self {
        RelationshipValue::ToOne(Some(target))
    }

    /// A to-many value holding `targets`.
    pub fn to_many(targets: impl IntoIterator<Item = ResourceIdentifier>) -> Self {
        RelationshipValue::ToMany(targets.into_iter().collect())
    }

    /// Returns `true` if no referent is linked.
    pub fn is_empty(&self) -> bool {
        match self {
            RelationshipValue::ToOne(target) => target.is_none(),
            RelationshipValue::ToMany(targets) => targets.is_empty(),
        }
    }

    /// Returns the to-one linkage, or `None` if this is a to-many value.
    pub fn as_to_one(&self) -> Option<Option<&ResourceIdentifier>> {
        match self {
            RelationshipValue::ToOne(target) => Some(target.as_ref()),
            RelationshipValue::ToMany(_) => None,
        }
    }

    /// Iterates over every linked referent.
    pub fn identifiers(&self) -> impl Iterator<Item = &ResourceIdentifier> {
        let slice: &[ResourceIdentifier] = match self {
            RelationshipValue::ToOne(target) => target.as_slice(),
            RelationshipValue::ToMany(targets) => targets,
        };
        slice.iter()
    }

    /// Returns `true` if `target` is linked.
    pub fn contains(&self, target: &ResourceIdentifier) -> bool {
        self.identifiers().any(|t| t == target)
    }

    /// Unlinks `target`. Returns `true` if it was linked.
    pub fn detach(&mut self, target: &ResourceIdentifier) -> bool {
        match self {
            RelationshipValue::ToOne(slot) => {
                if slot.as_ref() == Some(target) {
                    *slot = None;
                    true
                } else {
                    false
                }
            },
            RelationshipValue::ToMany(targets) => {
                let before = targets.len();
                targets.retain(|t| t != target);
                targets.len() != before
            },
        }
    }
}
