//! Relationship declarations.

use std::collections::BTreeSet;

/// Whether a relationship holds one referent or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one referent.
    ToOne,
    /// An ordered set of referents.
    ToMany,
}

/// Declaration of one relationship on a type.
///
/// The permitted target set is closed at startup. A relation with more than
/// one permitted type is polymorphic: its referent's concrete type is only
/// known once a linkage is bound.
///
/// ```rust
/// use jsonapi_graph::schema::{Cardinality, RelationshipSchema};
///
/// let my_stuff = RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"]);
/// assert!(my_stuff.is_polymorphic());
/// assert!(my_stuff.permits("tractor"));
/// assert!(!my_stuff.permits("boat"));
/// assert_eq!(my_stuff.cardinality(), Cardinality::ToOne);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSchema {
    name: String,
    cardinality: Cardinality,
    targets: BTreeSet<String>,
    inverse: Option<String>,
}

impl RelationshipSchema {
    /// A to-one relationship to a single type.
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToOne, [target.into()])
    }

    /// A to-many relationship to a single type.
    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToMany, [target.into()])
    }

    /// A polymorphic to-one relationship to any of `targets`.
    pub fn to_one_any<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, Cardinality::ToOne, targets.into_iter().map(Into::into))
    }

    /// A polymorphic to-many relationship to any of `targets`.
    pub fn to_many_any<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, Cardinality::ToMany, targets.into_iter().map(Into::into))
    }

    fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        targets: impl IntoIterator<Item = String>,
    ) -> Self {
        Self { name: name.into(), cardinality, targets: targets.into_iter().collect(), inverse: None }
    }

    /// Declares the relationship on the target type that mirrors this one.
    ///
    /// Writes through either side keep the other in step. Only monomorphic
    /// relationships may declare an inverse.
    #[must_use]
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    /// Returns the relationship name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cardinality.
    #[inline]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns `true` for to-one relationships.
    #[inline]
    pub fn is_to_one(&self) -> bool {
        self.cardinality == Cardinality::ToOne
    }

    /// Returns the permitted target types.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// Returns `true` if `resource_type` may be linked.
    pub fn permits(&self, resource_type: &str) -> bool {
        self.targets.contains(resource_type)
    }

    /// Returns `true` if more than one target type is permitted.
    pub fn is_polymorphic(&self) -> bool {
        self.targets.len() > 1
    }

    /// Returns the single target type of a monomorphic relationship.
    pub fn single_target(&self) -> Option<&str> {
        if self.targets.len() == 1 { self.targets.iter().next().map(String::as_str) } else { None }
    }

    /// Returns the inverse relationship name, if declared.
    pub fn inverse(&self) -> Option<&str> {
        self.inverse.as_deref()
    }
}
