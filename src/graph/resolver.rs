//! Polymorphic relationship resolution.

use crate::schema::{RelationshipSchema, TypeSchema};
use crate::store::{DataStore, LinkageChange};
use crate::types::{RelationshipValue, Resource, ResourceIdentifier};
use crate::{Error, Result};

/// Validates and resolves the relationships of one type.
///
/// A to-one slot moves between two states:
///
/// ```text
///            set(t, id)                 set(t2, id2)
///   Empty ──────────────▶ Bound(t, id) ─────────────▶ Bound(t2, id2)
///     ▲                      │
///     └──────── clear ───────┘          clear on Empty is a no-op
/// ```
///
/// The `(type, id)` pair is one value: binding replaces it whole.
///
/// ```rust
/// use jsonapi_graph::graph::RelationshipResolver;
/// use jsonapi_graph::schema::{RelationshipSchema, TypeSchema};
/// use jsonapi_graph::types::{Resource, ResourceIdentifier};
///
/// let property = TypeSchema::new("property")
///     .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"]));
/// let resolver = RelationshipResolver::new(&property);
/// let mut resource = Resource::new(ResourceIdentifier::new("property", "1"));
///
/// resolver.set(&mut resource, "myStuff", ResourceIdentifier::new("tractor", "1")).unwrap();
/// resolver.set(&mut resource, "myStuff", ResourceIdentifier::new("smartphone", "1")).unwrap();
/// assert_eq!(
///     resolver.get(&resource, "myStuff").unwrap(),
///     Some(&ResourceIdentifier::new("smartphone", "1"))
/// );
///
/// assert!(resolver.set(&mut resource, "myStuff", ResourceIdentifier::new("boat", "1")).is_err());
///
/// resolver.clear(&mut resource, "myStuff").unwrap();
/// assert_eq!(resolver.get(&resource, "myStuff").unwrap(), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RelationshipResolver<'a> {
    schema: &'a TypeSchema,
}

impl<'a> RelationshipResolver<'a> {
    /// Creates a resolver for relationships of `schema`.
    pub fn new(schema: &'a TypeSchema) -> Self {
        Self { schema }
    }

    /// Looks up a relationship declaration.
    pub fn declared(&self, relation: &str) -> Result<&'a RelationshipSchema> {
        self.schema.relationship(relation).ok_or_else(|| {
            Error::invalid_document(format!(
                "type '{}' has no relationship '{}'",
                self.schema.name(),
                relation
            ))
            .with_pointer(format!("/data/relationships/{}", relation))
        })
    }

    /// Checks a full linkage value against the declaration of `relation`.
    ///
    /// Every referent type must be permitted, the cardinality must match, and
    /// a to-many linkage may not repeat a referent.
    pub fn validate(&self, relation: &str, value: &RelationshipValue) -> Result<()> {
        let declared = self.declared(relation)?;
        match value {
            RelationshipValue::ToOne(_) if !declared.is_to_one() => {
                return Err(self.cardinality_error(declared));
            },
            RelationshipValue::ToMany(_) if declared.is_to_one() => {
                return Err(self.cardinality_error(declared));
            },
            _ => {},
        }
        self.validate_members(declared, value.identifiers())?;
        Ok(())
    }

    /// Validates a linkage change against the declaration of `relation`.
    pub fn validate_change(&self, relation: &str, change: &LinkageChange) -> Result<()> {
        match change {
            LinkageChange::Replace(value) => self.validate(relation, value),
            LinkageChange::Add(targets) | LinkageChange::Remove(targets) => {
                let declared = self.declared(relation)?;
                if declared.is_to_one() {
                    return Err(Error::method_not_allowed(format!(
                        "'{}.{}' is to-one; only replacement is supported",
                        self.schema.name(),
                        relation
                    )));
                }
                self.validate_members(declared, targets.iter())
            },
        }
    }

    /// Binds a to-one slot, replacing any previous referent.
    pub fn set(
        &self,
        resource: &mut Resource,
        relation: &str,
        target: ResourceIdentifier,
    ) -> Result<()> {
        let value = RelationshipValue::to_one(target);
        self.validate(relation, &value)?;
        resource.relationships_mut().insert(relation.to_string(), value);
        Ok(())
    }

    /// Returns the referent of a to-one slot, or `None` when empty.
    pub fn get<'r>(
        &self,
        resource: &'r Resource,
        relation: &str,
    ) -> Result<Option<&'r ResourceIdentifier>> {
        let declared = self.declared(relation)?;
        if !declared.is_to_one() {
            return Err(self.cardinality_error(declared));
        }
        Ok(resource.relationship(relation).and_then(RelationshipValue::as_to_one).flatten())
    }

    /// Empties a to-one slot. Clearing an empty slot is a no-op.
    pub fn clear(&self, resource: &mut Resource, relation: &str) -> Result<()> {
        let declared = self.declared(relation)?;
        if !declared.is_to_one() {
            return Err(self.cardinality_error(declared));
        }
        resource.relationships_mut().insert(relation.to_string(), RelationshipValue::empty_to_one());
        Ok(())
    }

    /// Returns the declared linkage of `relation`, defaulting an unset slot
    /// to empty.
    pub fn linkage(&self, resource: &Resource, relation: &str) -> Result<RelationshipValue> {
        let declared = self.declared(relation)?;
        Ok(match resource.relationship(relation) {
            Some(value) => value.clone(),
            None if declared.is_to_one() => RelationshipValue::empty_to_one(),
            None => RelationshipValue::ToMany(Vec::new()),
        })
    }

    /// Fetches the referent named by `target` from `store`.
    pub fn resolve(&self, store: &dyn DataStore, target: &ResourceIdentifier) -> Result<Resource> {
        store
            .read(target)?
            .ok_or_else(|| Error::not_found(format!("resource '{}' does not exist", target)))
    }

    fn validate_members<'v>(
        &self,
        declared: &RelationshipSchema,
        members: impl Iterator<Item = &'v ResourceIdentifier>,
    ) -> Result<()> {
        let mut seen: Vec<&ResourceIdentifier> = Vec::new();
        for member in members {
            if !declared.permits(member.resource_type()) {
                return Err(Error::invalid_relation_type(format!(
                    "type '{}' is not a permitted target of '{}.{}' (expected one of: {})",
                    member.resource_type(),
                    self.schema.name(),
                    declared.name(),
                    declared.targets().collect::<Vec<_>>().join(", ")
                ))
                .with_pointer(format!("/data/relationships/{}", declared.name())));
            }
            if seen.contains(&member) {
                return Err(Error::invalid_document(format!(
                    "'{}' appears twice in '{}.{}'",
                    member,
                    self.schema.name(),
                    declared.name()
                ))
                .with_pointer(format!("/data/relationships/{}", declared.name())));
            }
            seen.push(member);
        }
        Ok(())
    }

    fn cardinality_error(&self, declared: &RelationshipSchema) -> Error {
        let expected = if declared.is_to_one() { "a single linkage or null" } else { "an array of linkages" };
        Error::invalid_document(format!(
            "'{}.{}' expects {}",
            self.schema.name(),
            declared.name(),
            expected
        ))
        .with_pointer(format!("/data/relationships/{}", declared.name()))
    }
}
