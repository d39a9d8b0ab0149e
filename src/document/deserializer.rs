//! Request body parsing.
//!
//! Bodies are parsed against the schema of the addressed type: unknown
//! fields, mistyped attribute values, and linkage to types a relationship
//! does not permit are rejected before anything reaches the store.

use super::{Linkage, LinkageDocument, ResourceDocument};
use crate::graph::RelationshipResolver;
use crate::schema::TypeSchema;
use crate::store::{LinkageChange, ResourcePatch};
use crate::types::{RelationshipValue, Resource, ResourceIdentifier};
use crate::{Error, Result};

/// What a relationship-endpoint body should do to the linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageIntent {
    /// `PATCH`: replace the linkage.
    Replace,
    /// `POST`: add members to a to-many linkage.
    Add,
    /// `DELETE`: remove members from a to-many linkage.
    Remove,
}

/// Parses a create body into a draft resource of `schema`'s type.
///
/// A client-supplied id is ignored; the store assigns one.
///
/// ```rust
/// use jsonapi_graph::document::parse_create;
/// use jsonapi_graph::schema::{AttributeKind, TypeSchema};
///
/// let tractor = TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer);
/// let draft = parse_create(r#"{"data": {"type": "tractor", "attributes": {"horsepower": 102}}}"#, &tractor).unwrap();
/// assert_eq!(draft.attribute("horsepower"), Some(&serde_json::json!(102)));
///
/// let wrong = parse_create(r#"{"data": {"type": "smartphone"}}"#, &tractor);
/// assert!(wrong.is_err());
/// ```
pub fn parse_create(body: &str, schema: &TypeSchema) -> Result<Resource> {
    let document: ResourceDocument = serde_json::from_str(body)?;
    let incoming = document.data;
    check_type(&incoming.resource_type, schema)?;
    if let Some(id) = &incoming.id {
        tracing::debug!(resource_type = schema.name(), id = %id, "ignoring client-supplied id");
    }

    let mut draft = Resource::new(ResourceIdentifier::new(schema.name(), ""));
    for (name, value) in incoming.attributes {
        check_attribute(schema, &name, &value)?;
        draft = draft.with_attribute(name, value);
    }

    let resolver = RelationshipResolver::new(schema);
    for (name, linkage) in incoming.relationships {
        let value = required_linkage(&name, linkage)?;
        resolver.validate(&name, &value)?;
        draft = draft.with_relationship(name, value);
    }
    Ok(draft)
}

/// Parses an update body for `identifier` into a patch.
///
/// Only members present in the body end up in the patch.
pub fn parse_patch(body: &str, identifier: &ResourceIdentifier, schema: &TypeSchema) -> Result<ResourcePatch> {
    let document: ResourceDocument = serde_json::from_str(body)?;
    let incoming = document.data;
    check_type(&incoming.resource_type, schema)?;
    match incoming.id.as_deref() {
        Some(id) if id == identifier.id() => {},
        Some(id) => {
            return Err(Error::invalid_document(format!(
                "body id '{}' does not match the addressed resource '{}'",
                id, identifier
            ))
            .with_pointer("/data/id"));
        },
        None => {
            return Err(Error::invalid_document("update body requires 'id'").with_pointer("/data/id"));
        },
    }

    let mut patch = ResourcePatch::new(identifier.clone());
    for (name, value) in incoming.attributes {
        check_attribute(schema, &name, &value)?;
        patch.set_attribute(name, value);
    }

    let resolver = RelationshipResolver::new(schema);
    for (name, linkage) in incoming.relationships {
        let value = required_linkage(&name, linkage)?;
        resolver.validate(&name, &value)?;
        patch.set_linkage(name, LinkageChange::Replace(value));
    }
    Ok(patch)
}

/// Parses a relationship-endpoint body into a linkage change.
pub fn parse_linkage(
    body: &str,
    resolver: &RelationshipResolver<'_>,
    relation: &str,
    intent: LinkageIntent,
) -> Result<LinkageChange> {
    let document: LinkageDocument = serde_json::from_str(body)?;
    let value = required_linkage(relation, document)?;
    let change = match intent {
        LinkageIntent::Replace => LinkageChange::Replace(value),
        LinkageIntent::Add | LinkageIntent::Remove => {
            let RelationshipValue::ToMany(targets) = value else {
                return Err(Error::invalid_document("expected an array of linkages").with_pointer("/data"));
            };
            if intent == LinkageIntent::Add {
                LinkageChange::Add(targets)
            } else {
                LinkageChange::Remove(targets)
            }
        },
    };
    resolver.validate_change(relation, &change)?;
    Ok(change)
}

fn check_type(resource_type: &str, schema: &TypeSchema) -> Result<()> {
    if resource_type != schema.name() {
        return Err(Error::invalid_document(format!(
            "body type '{}' does not match the addressed type '{}'",
            resource_type,
            schema.name()
        ))
        .with_pointer("/data/type"));
    }
    Ok(())
}

fn check_attribute(schema: &TypeSchema, name: &str, value: &serde_json::Value) -> Result<()> {
    let pointer = format!("/data/attributes/{}", name);
    let Some(kind) = schema.attribute_kind(name) else {
        return Err(Error::invalid_document(format!(
            "type '{}' has no attribute '{}'",
            schema.name(),
            name
        ))
        .with_pointer(pointer));
    };
    if !kind.accepts(value) {
        return Err(Error::invalid_argument(format!(
            "attribute '{}' expects a value of kind {}",
            name, kind
        ))
        .with_pointer(pointer));
    }
    Ok(())
}

fn required_linkage(relation: &str, document: LinkageDocument) -> Result<RelationshipValue> {
    match document.data {
        Some(linkage) => Ok(Linkage::into_value(linkage)),
        None => Err(Error::invalid_document(format!(
            "relationship '{}' requires a 'data' member",
            relation
        ))
        .with_pointer(format!("/data/relationships/{}", relation))),
    }
}
