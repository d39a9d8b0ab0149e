//! Permission-filtered response serialization.

use std::collections::{BTreeMap, HashSet};

use super::{Document, DocumentMeta, PrimaryData, RelationshipObject, ResourceObject};
use crate::graph::{PageMeta, RelationshipResolver};
use crate::permission::{Action, PermissionEvaluator, Target};
use crate::query::ResolvedQuery;
use crate::schema::SchemaRegistry;
use crate::store::DataStore;
use crate::types::{Principal, RelationshipValue, Resource, ResourceIdentifier};
use crate::{Error, Result};

/// Renders resources as JSON:API documents for one principal.
///
/// Everything the principal may not read is left out: unreadable fields
/// are omitted, linkage to unreadable resources is dropped, and unreadable
/// resources never reach `included`.
pub struct Serializer<'a> {
    schema: &'a SchemaRegistry,
    permissions: &'a PermissionEvaluator,
    store: &'a dyn DataStore,
    principal: &'a Principal,
    query: &'a ResolvedQuery,
}

impl<'a> Serializer<'a> {
    /// Creates a serializer.
    pub fn new(
        schema: &'a SchemaRegistry,
        permissions: &'a PermissionEvaluator,
        store: &'a dyn DataStore,
        principal: &'a Principal,
        query: &'a ResolvedQuery,
    ) -> Self {
        Self { schema, permissions, store, principal, query }
    }

    /// Returns `true` if the principal may read `resource`.
    pub fn can_read(&self, resource: &Resource) -> bool {
        self.permissions.can(Action::Read, self.principal, &Target::entity(resource))
    }

    /// Returns `true` if the principal may read `field` of `resource`.
    pub fn can_read_field(&self, resource: &Resource, field: &str) -> bool {
        self.permissions.can(Action::Read, self.principal, &Target::field(resource, field))
    }

    /// Renders one resource.
    pub fn resource_object(&self, resource: &Resource) -> Result<ResourceObject> {
        let schema = self.schema.require(resource.resource_type())?;
        let fieldset = self.query.fieldset(resource.resource_type());
        let wanted = |name: &str| fieldset.is_none_or(|f| f.contains(name));

        let mut attributes = BTreeMap::new();
        for name in schema.attribute_names() {
            if wanted(name) && self.can_read_field(resource, name) {
                let value = resource.attribute(name).cloned().unwrap_or_default();
                attributes.insert(name.to_string(), value);
            }
        }

        let mut relationships = BTreeMap::new();
        for relationship in schema.relationships() {
            let name = relationship.name();
            if wanted(name) && self.can_read_field(resource, name) {
                let data = self.visible_linkage(resource, name)?;
                relationships.insert(name.to_string(), RelationshipObject { data });
            }
        }

        Ok(ResourceObject {
            resource_type: resource.resource_type().to_string(),
            id: resource.id().to_string(),
            attributes,
            relationships,
        })
    }

    /// Returns the linkage of `relation` restricted to readable referents.
    pub fn visible_linkage(&self, owner: &Resource, relation: &str) -> Result<RelationshipValue> {
        let schema = self.schema.require(owner.resource_type())?;
        let linkage = RelationshipResolver::new(schema).linkage(owner, relation)?;
        Ok(match linkage {
            RelationshipValue::ToOne(Some(target)) => {
                RelationshipValue::ToOne(self.load_readable(&target)?.map(|_| target))
            },
            RelationshipValue::ToOne(None) => RelationshipValue::empty_to_one(),
            RelationshipValue::ToMany(targets) => {
                let mut visible = Vec::with_capacity(targets.len());
                for target in targets {
                    if self.load_readable(&target)?.is_some() {
                        visible.push(target);
                    }
                }
                RelationshipValue::ToMany(visible)
            },
        })
    }

    /// Loads `target` if it exists and the principal may read it.
    pub fn load_readable(&self, target: &ResourceIdentifier) -> Result<Option<Resource>> {
        Ok(self.store.read(target)?.filter(|r| self.can_read(r)))
    }

    /// Collects `included` for `primary` along every include path.
    ///
    /// Entries are unique by `(type, id)` and never repeat primary data.
    pub fn included(&self, primary: &[Resource]) -> Result<Vec<ResourceObject>> {
        let mut seen: HashSet<ResourceIdentifier> =
            primary.iter().map(|r| r.identifier().clone()).collect();
        let mut included = Vec::new();

        for path in self.query.include() {
            let mut frontier: Vec<Resource> = primary.to_vec();
            for segment in path {
                let mut next = Vec::new();
                let mut queued = HashSet::new();
                for resource in &frontier {
                    let declared = self
                        .schema
                        .get(resource.resource_type())
                        .is_some_and(|s| s.relationship(segment).is_some());
                    if !declared || !self.can_read_field(resource, segment) {
                        continue;
                    }
                    for target in self.visible_linkage(resource, segment)?.identifiers() {
                        let Some(referent) = self.load_readable(target)? else {
                            continue;
                        };
                        if seen.insert(target.clone()) {
                            included.push(self.resource_object(&referent)?);
                        }
                        if queued.insert(target.clone()) {
                            next.push(referent);
                        }
                    }
                }
                frontier = next;
            }
        }
        Ok(included)
    }

    /// A single-resource document. `None` renders `data: null`.
    pub fn single(&self, resource: Option<&Resource>) -> Result<Document> {
        let primary: Vec<Resource> = resource.into_iter().cloned().collect();
        let data = match resource {
            Some(resource) => Some(Box::new(self.resource_object(resource)?)),
            None => None,
        };
        Ok(Document { data: PrimaryData::Single(data), included: self.included(&primary)?, meta: None })
    }

    /// A collection document.
    pub fn collection(&self, resources: &[Resource], page: Option<PageMeta>) -> Result<Document> {
        let data = resources.iter().map(|r| self.resource_object(r)).collect::<Result<Vec<_>>>()?;
        Ok(Document {
            data: PrimaryData::Collection(data),
            included: self.included(resources)?,
            meta: page.map(|page| DocumentMeta { page }),
        })
    }

    /// A relationship-endpoint document: linkage only.
    pub fn linkage(&self, owner: &Resource, relation: &str) -> Result<Document> {
        let data = self.visible_linkage(owner, relation)?;
        Ok(Document { data: PrimaryData::Linkage(data), included: Vec::new(), meta: None })
    }
}

/// Renders a document to JSON.
pub fn to_json(document: &Document) -> Result<serde_json::Value> {
    serde_json::to_value(document)
        .map_err(|e| Error::internal(format!("failed to serialize document: {}", e)).with_source(e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use super::*;
    use crate::PaginationConfig;
    use crate::permission::CheckRegistry;
    use crate::query::{CapabilityGate, QueryParams, ResponseShape};
    use crate::schema::{AttributeKind, RelationshipSchema, TypeSchema};
    use crate::store::{Attachment, Collection, CollectionQuery, InMemoryStore, ResourcePatch};
    use serde_json::json;

    struct Fixture {
        schema: Arc<SchemaRegistry>,
        permissions: PermissionEvaluator,
        store: InMemoryStore,
    }

    fn fixture() -> Fixture {
        let schema = Arc::new(
            SchemaRegistry::builder()
                .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
                .register(
                    TypeSchema::new("smartphone")
                        .with_attribute("type", AttributeKind::String)
                        .with_permission(Action::Read, "Prefab.Role.None"),
                )
                .register(
                    TypeSchema::new("property")
                        .with_attribute("owner", AttributeKind::String)
                        .with_attribute("secret", AttributeKind::String)
                        .with_field_permission("secret", Action::Read, "deny all")
                        .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"]))
                        .with_relationship(RelationshipSchema::to_many_any("things", ["tractor", "smartphone"])),
                )
                .build()
                .unwrap(),
        );
        let permissions = schema.compile_permissions(&CheckRegistry::new()).unwrap();
        let store = InMemoryStore::new(schema.clone());
        Fixture { schema, permissions, store }
    }

    fn resolved(fixture: &Fixture, query: &str) -> ResolvedQuery {
        let pagination = PaginationConfig::default();
        let gate = CapabilityGate::new(&fixture.schema, &pagination);
        let primary = fixture.schema.get("property").unwrap();
        gate.check(&QueryParams::parse(query).unwrap(), &[primary], ResponseShape::Single).unwrap()
    }

    fn create(store: &InMemoryStore, resource: Resource) -> Resource {
        store.create(resource, None).unwrap()
    }

    fn draft(resource_type: &str) -> Resource {
        Resource::new(ResourceIdentifier::new(resource_type, ""))
    }

    #[test]
    fn test_unreadable_field_and_referents_are_hidden() {
        let fixture = fixture();
        let tractor = create(&fixture.store, draft("tractor").with_attribute("horsepower", 102));
        let phone = create(&fixture.store, draft("smartphone").with_attribute("type", "android"));
        let property = create(
            &fixture.store,
            draft("property")
                .with_attribute("owner", "alice")
                .with_attribute("secret", "hidden")
                .with_relationship("myStuff", RelationshipValue::to_one(phone.identifier().clone()))
                .with_relationship(
                    "things",
                    RelationshipValue::to_many([tractor.identifier().clone(), phone.identifier().clone()]),
                ),
        );

        let query = resolved(&fixture, "include=myStuff,things");
        let principal = Principal::anonymous();
        let serializer =
            Serializer::new(&fixture.schema, &fixture.permissions, &fixture.store, &principal, &query);
        let body = to_json(&serializer.single(Some(&property)).unwrap()).unwrap();

        assert_eq!(body["data"]["attributes"], json!({"owner": "alice"}));
        assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!(null));
        assert_eq!(body["data"]["relationships"]["things"]["data"], json!([{"type": "tractor", "id": "1"}]));
        assert_eq!(body["included"], json!([
            {"type": "tractor", "id": "1", "attributes": {"horsepower": 102}, "relationships": {}}
        ]));
    }

    #[test]
    fn test_sparse_fieldset() {
        let fixture = fixture();
        let property = create(&fixture.store, draft("property").with_attribute("owner", "alice"));
        let query = resolved(&fixture, "fields[property]=owner");
        let principal = Principal::anonymous();
        let serializer =
            Serializer::new(&fixture.schema, &fixture.permissions, &fixture.store, &principal, &query);
        let object = serializer.resource_object(&property).unwrap();
        assert_eq!(object.attributes.keys().collect::<Vec<_>>(), vec!["owner"]);
        assert!(object.relationships.is_empty());
    }

    #[test]
    fn test_included_never_repeats_primary() {
        let fixture = fixture();
        let tractor = create(&fixture.store, draft("tractor"));
        let first = create(
            &fixture.store,
            draft("property").with_relationship("myStuff", RelationshipValue::to_one(tractor.identifier().clone())),
        );
        let second = create(
            &fixture.store,
            draft("property").with_relationship("myStuff", RelationshipValue::to_one(tractor.identifier().clone())),
        );

        let query = resolved(&fixture, "include=myStuff");
        let principal = Principal::anonymous();
        let serializer =
            Serializer::new(&fixture.schema, &fixture.permissions, &fixture.store, &principal, &query);
        let document = serializer.collection(&[first, second], None).unwrap();
        assert_eq!(document.included.len(), 1);
        assert_eq!(document.included[0].identifier(), *tractor.identifier());
    }

    /// Counts reads of one identifier on top of an [`InMemoryStore`].
    struct CountingStore {
        inner: InMemoryStore,
        watched: ResourceIdentifier,
        reads: AtomicUsize,
    }

    impl DataStore for CountingStore {
        fn create(&self, draft: Resource, attach: Option<&Attachment>) -> Result<Resource> {
            self.inner.create(draft, attach)
        }

        fn read(&self, identifier: &ResourceIdentifier) -> Result<Option<Resource>> {
            if *identifier == self.watched {
                self.reads.fetch_add(1, AtomicOrdering::SeqCst);
            }
            self.inner.read(identifier)
        }

        fn patch(&self, patch: &ResourcePatch) -> Result<Resource> {
            self.inner.patch(patch)
        }

        fn delete(&self, identifier: &ResourceIdentifier) -> Result<()> {
            self.inner.delete(identifier)
        }

        fn list(&self, resource_type: &str, query: &CollectionQuery<'_>) -> Result<Collection> {
            self.inner.list(resource_type, query)
        }
    }

    #[test]
    fn test_shared_referents_are_walked_once_per_level() {
        let schema = Arc::new(
            SchemaRegistry::builder()
                .register(TypeSchema::new("dealer"))
                .register(TypeSchema::new("tractor").with_relationship(RelationshipSchema::to_one("dealer", "dealer")))
                .register(TypeSchema::new("garage").with_relationship(RelationshipSchema::to_many("vehicles", "tractor")))
                .build()
                .unwrap(),
        );
        let permissions = schema.compile_permissions(&CheckRegistry::new()).unwrap();
        let inner = InMemoryStore::new(schema.clone());
        let dealer = inner.create(draft("dealer"), None).unwrap();
        let tractors: Vec<ResourceIdentifier> = (0..2)
            .map(|_| {
                let tractor = draft("tractor")
                    .with_relationship("dealer", RelationshipValue::to_one(dealer.identifier().clone()));
                inner.create(tractor, None).unwrap().identifier().clone()
            })
            .collect();
        let garages: Vec<Resource> = (0..2)
            .map(|_| {
                let garage = draft("garage").with_relationship("vehicles", RelationshipValue::to_many(tractors.clone()));
                inner.create(garage, None).unwrap()
            })
            .collect();
        let store = CountingStore { inner, watched: dealer.identifier().clone(), reads: AtomicUsize::new(0) };

        let pagination = PaginationConfig::default();
        let gate = CapabilityGate::new(&schema, &pagination);
        let garage_schema = schema.get("garage").unwrap();
        let query = gate
            .check(&QueryParams::parse("include=vehicles,vehicles.dealer").unwrap(), &[garage_schema], ResponseShape::Collection)
            .unwrap();
        let principal = Principal::anonymous();
        let serializer = Serializer::new(&schema, &permissions, &store, &principal, &query);
        let included = serializer.included(&garages).unwrap();

        let identifiers: Vec<String> = included.iter().map(|o| o.identifier().to_string()).collect();
        assert_eq!(identifiers, vec!["tractor/1", "tractor/2", "dealer/1"]);
        // Two tractors at the second level, each read for linkage and for inclusion.
        assert_eq!(store.reads.load(AtomicOrdering::SeqCst), 4);
    }

    #[test]
    fn test_unset_relationships_render_empty() {
        let fixture = fixture();
        let property = create(&fixture.store, draft("property"));
        let query = ResolvedQuery::default();
        let principal = Principal::anonymous();
        let serializer =
            Serializer::new(&fixture.schema, &fixture.permissions, &fixture.store, &principal, &query);
        let body = to_json(&serializer.single(Some(&property)).unwrap()).unwrap();
        assert_eq!(body["data"]["relationships"]["myStuff"]["data"], json!(null));
        assert_eq!(body["data"]["relationships"]["things"]["data"], json!([]));
        assert_eq!(body["data"]["attributes"], json!({"owner": null}));
        assert!(body.get("included").is_none());
    }
}
