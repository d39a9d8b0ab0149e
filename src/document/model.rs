//! JSON:API document shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::Error;
use crate::graph::PageMeta;
use crate::types::{RelationshipValue, ResourceIdentifier};

/// A top-level response document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Primary data.
    pub data: PrimaryData,

    /// Side-loaded resources, de-duplicated by `(type, id)`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,

    /// Collection metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,
}

/// The `data` member of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// One resource, or `null`.
    Single(Option<Box<ResourceObject>>),
    /// A collection of resources.
    Collection(Vec<ResourceObject>),
    /// Bare linkage, for relationship endpoints.
    Linkage(RelationshipValue),
}

/// The `meta` member of a collection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    /// Pagination totals.
    pub page: PageMeta,
}

/// A serialized resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource id.
    pub id: String,
    /// Readable attributes in the requested fieldset.
    pub attributes: BTreeMap<String, Value>,
    /// Readable relationships in the requested fieldset.
    pub relationships: BTreeMap<String, RelationshipObject>,
}

impl ResourceObject {
    /// Returns the `(type, id)` of this object.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.resource_type.clone(), self.id.clone())
    }
}

/// A relationship member: linkage only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipObject {
    /// `{type, id}`, `null`, or an array of linkages.
    pub data: RelationshipValue,
}

/// A request body carrying one resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceDocument {
    /// The resource.
    pub data: IncomingResource,
}

/// A resource as sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingResource {
    /// Resource type; must match the addressed type.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource id. Ignored on create, checked on update.
    #[serde(default)]
    pub id: Option<String>,

    /// Attribute values. Absent attributes are unchanged.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    /// Relationship linkage. Absent relationships are unchanged.
    #[serde(default)]
    pub relationships: BTreeMap<String, LinkageDocument>,
}

/// A body of the form `{"data": <linkage>}`.
///
/// `data` distinguishes three cases:
///
/// | JSON                    | `data`                 |
/// |-------------------------|------------------------|
/// | key absent              | `None`                 |
/// | `"data": null`          | `Some(None)`           |
/// | `"data": {..}` / `[..]` | `Some(Some(linkage))`  |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkageDocument {
    /// The linkage, with absence and `null` kept apart.
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Option<Linkage>>,
}

/// Linkage sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    /// A single identifier.
    One(ResourceIdentifier),
    /// An array of identifiers.
    Many(Vec<ResourceIdentifier>),
}

impl Linkage {
    /// Converts optional linkage into a relationship value; `None` is an
    /// empty to-one.
    pub fn into_value(linkage: Option<Linkage>) -> RelationshipValue {
        match linkage {
            None => RelationshipValue::empty_to_one(),
            Some(Linkage::One(target)) => RelationshipValue::to_one(target),
            Some(Linkage::Many(targets)) => RelationshipValue::ToMany(targets),
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Renders `error` as a JSON:API error document.
///
/// ```rust
/// use jsonapi_graph::Error;
/// use jsonapi_graph::document::error_document;
/// use serde_json::json;
///
/// let body = error_document(&Error::not_found("resource 'tractor/9' does not exist"));
/// assert_eq!(body["errors"][0]["status"], json!("404"));
/// ```
pub fn error_document(error: &Error) -> Value {
    json!({ "errors": [error.to_json()] })
}
