//! InMemoryStore: the bundled [`DataStore`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::{Attachment, Collection, CollectionQuery, DataStore, LinkageChange, ResourcePatch};
use crate::config::IdStrategy;
use crate::graph::RelationshipResolver;
use crate::schema::{RelationshipSchema, SchemaRegistry};
use crate::types::{RelationshipValue, Resource, ResourceIdentifier};
use crate::{Error, Result};

/// An in-memory store with real linkage semantics.
///
/// One lock guards every table. Writes hold the write lock for the whole
/// mutation, including inverse maintenance, so concurrent readers see either
/// all of a write or none of it. Rows come back in insertion order.
///
/// Cloning is cheap and clones share the same tables.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use jsonapi_graph::schema::{AttributeKind, RelationshipSchema, SchemaRegistry, TypeSchema};
/// use jsonapi_graph::store::{DataStore, InMemoryStore};
/// use jsonapi_graph::types::{RelationshipValue, Resource, ResourceIdentifier};
///
/// let schema = SchemaRegistry::builder()
///     .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
///     .register(TypeSchema::new("property").with_relationship(RelationshipSchema::to_one("myStuff", "tractor")))
///     .build()
///     .unwrap();
/// let store = InMemoryStore::new(Arc::new(schema));
///
/// let tractor = store
///     .create(Resource::new(ResourceIdentifier::new("tractor", "")).with_attribute("horsepower", 102), None)
///     .unwrap();
/// assert_eq!(tractor.id(), "1");
///
/// let property = store
///     .create(
///         Resource::new(ResourceIdentifier::new("property", ""))
///             .with_relationship("myStuff", RelationshipValue::to_one(tractor.identifier().clone())),
///         None,
///     )
///     .unwrap();
/// assert_eq!(property.id(), "1");
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    schema: Arc<SchemaRegistry>,
    id_strategy: IdStrategy,
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store using sequential ids.
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self::with_id_strategy(schema, IdStrategy::default())
    }

    /// Creates an empty store using `id_strategy`.
    pub fn with_id_strategy(schema: Arc<SchemaRegistry>, id_strategy: IdStrategy) -> Self {
        Self { schema, id_strategy, tables: Arc::new(RwLock::new(Tables::default())) }
    }

    /// Returns the number of stored resources of `resource_type`.
    pub fn count(&self, resource_type: &str) -> usize {
        self.tables.read().types.get(resource_type).map_or(0, |t| t.rows.len())
    }

    /// Returns the number of stored resources across all types.
    pub fn len(&self) -> usize {
        self.tables.read().types.values().map(|t| t.rows.len()).sum()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every resource. Id counters restart.
    pub fn clear(&self) {
        self.tables.write().types.clear();
    }

    fn next_id(&self, tables: &Tables, resource_type: &str) -> String {
        match self.id_strategy {
            IdStrategy::Sequential => {
                let last = tables.types.get(resource_type).map_or(0, |t| t.last_id);
                (last + 1).to_string()
            },
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
        }
    }
}

impl DataStore for InMemoryStore {
    fn create(&self, mut draft: Resource, attach: Option<&Attachment>) -> Result<Resource> {
        self.schema.require(draft.resource_type())?;

        let mut tables = self.tables.write();
        let id = self.next_id(&tables, draft.resource_type());
        draft.assign_id(id);
        let identifier = draft.identifier().clone();
        let linkages = std::mem::take(draft.relationships_mut());

        let mut staging = Staging::new(&self.schema, &tables);
        staging.insert(draft);
        for (relation, value) in linkages {
            staging.replace_linkage(&identifier, &relation, value)?;
        }
        if let Some(attach) = attach {
            staging.link(attach.owner(), attach.relation(), &identifier)?;
        }
        let created = staging.snapshot(&identifier)?;
        let staged = staging.into_staged();
        tables.commit(staged);

        tracing::debug!(resource = %identifier, "resource created");
        Ok(created)
    }

    fn read(&self, identifier: &ResourceIdentifier) -> Result<Option<Resource>> {
        Ok(self.tables.read().get(identifier).cloned())
    }

    fn patch(&self, patch: &ResourcePatch) -> Result<Resource> {
        let identifier = patch.identifier();
        let mut tables = self.tables.write();

        let mut staging = Staging::new(&self.schema, &tables);
        let resource = staging.get_mut(identifier)?;
        for (name, value) in patch.attributes() {
            resource.attributes_mut().insert(name.clone(), value.clone());
        }
        for (relation, change) in patch.linkages() {
            match change {
                LinkageChange::Replace(value) => {
                    staging.replace_linkage(identifier, relation, value.clone())?
                },
                LinkageChange::Add(targets) => staging.add_linkage(identifier, relation, targets)?,
                LinkageChange::Remove(targets) => {
                    staging.remove_linkage(identifier, relation, targets)?
                },
            }
        }
        let updated = staging.snapshot(identifier)?;
        let staged = staging.into_staged();
        let touched = staged.len();
        tables.commit(staged);

        tracing::debug!(resource = %identifier, touched, "resource patched");
        Ok(updated)
    }

    fn delete(&self, identifier: &ResourceIdentifier) -> Result<()> {
        let mut tables = self.tables.write();
        let removed = tables
            .types
            .get_mut(identifier.resource_type())
            .and_then(|t| t.remove(identifier.id()));
        if removed.is_none() {
            return Err(missing(identifier));
        }

        let mut detached = 0usize;
        for table in tables.types.values_mut() {
            for row in table.rows.values_mut() {
                for value in row.relationships_mut().values_mut() {
                    if value.detach(identifier) {
                        detached += 1;
                    }
                }
            }
        }

        tracing::debug!(resource = %identifier, detached, "resource deleted");
        Ok(())
    }

    fn list(&self, resource_type: &str, query: &CollectionQuery<'_>) -> Result<Collection> {
        let rows: Vec<Resource> = {
            let tables = self.tables.read();
            tables
                .types
                .get(resource_type)
                .map(|t| t.rows.values().cloned().collect())
                .unwrap_or_default()
        };
        Ok(query.run(rows))
    }
}

fn missing(identifier: &ResourceIdentifier) -> Error {
    Error::not_found(format!("resource '{}' does not exist", identifier))
}

#[derive(Debug, Default)]
struct Tables {
    types: HashMap<String, Table>,
}

impl Tables {
    fn get(&self, identifier: &ResourceIdentifier) -> Option<&Resource> {
        self.types.get(identifier.resource_type())?.get(identifier.id())
    }

    fn commit(&mut self, staged: BTreeMap<ResourceIdentifier, Resource>) {
        for (identifier, resource) in staged {
            self.types.entry(identifier.resource_type().to_string()).or_default().upsert(resource);
        }
    }
}

/// Rows of one type, keyed by insertion sequence.
#[derive(Debug, Default)]
struct Table {
    last_id: u64,
    next_seq: u64,
    rows: BTreeMap<u64, Resource>,
    index: HashMap<String, u64>,
}

impl Table {
    fn get(&self, id: &str) -> Option<&Resource> {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    fn upsert(&mut self, resource: Resource) {
        if let Ok(numeric) = resource.id().parse::<u64>() {
            self.last_id = self.last_id.max(numeric);
        }
        match self.index.get(resource.id()) {
            Some(seq) => {
                self.rows.insert(*seq, resource);
            },
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(resource.id().to_string(), seq);
                self.rows.insert(seq, resource);
            },
        }
    }

    fn remove(&mut self, id: &str) -> Option<Resource> {
        let seq = self.index.remove(id)?;
        self.rows.remove(&seq)
    }
}

/// Copy-on-write view of the tables for one write.
///
/// Every change lands in `staged`; the tables are only touched by
/// [`Tables::commit`] once the whole write has succeeded.
struct Staging<'a> {
    schema: &'a SchemaRegistry,
    tables: &'a Tables,
    staged: BTreeMap<ResourceIdentifier, Resource>,
}

impl<'a> Staging<'a> {
    fn new(schema: &'a SchemaRegistry, tables: &'a Tables) -> Self {
        Self { schema, tables, staged: BTreeMap::new() }
    }

    fn insert(&mut self, resource: Resource) {
        self.staged.insert(resource.identifier().clone(), resource);
    }

    fn get(&self, identifier: &ResourceIdentifier) -> Option<&Resource> {
        self.staged.get(identifier).or_else(|| self.tables.get(identifier))
    }

    fn get_mut(&mut self, identifier: &ResourceIdentifier) -> Result<&mut Resource> {
        if !self.staged.contains_key(identifier) {
            let current = self.tables.get(identifier).cloned().ok_or_else(|| missing(identifier))?;
            self.staged.insert(identifier.clone(), current);
        }
        self.staged.get_mut(identifier).ok_or_else(|| missing(identifier))
    }

    fn snapshot(&self, identifier: &ResourceIdentifier) -> Result<Resource> {
        self.get(identifier).cloned().ok_or_else(|| missing(identifier))
    }

    fn into_staged(self) -> BTreeMap<ResourceIdentifier, Resource> {
        self.staged
    }

    fn declared(&self, owner: &ResourceIdentifier, relation: &str) -> Result<&'a RelationshipSchema> {
        self.schema.get(owner.resource_type()).and_then(|t| t.relationship(relation)).ok_or_else(|| {
            Error::invalid_argument(format!(
                "type '{}' has no relationship '{}'",
                owner.resource_type(),
                relation
            ))
        })
    }

    fn replace_linkage(
        &mut self,
        owner: &ResourceIdentifier,
        relation: &str,
        value: RelationshipValue,
    ) -> Result<()> {
        let declared = self.declared(owner, relation)?;
        let schema: &'a SchemaRegistry = self.schema;
        let resolver = RelationshipResolver::new(schema.require(owner.resource_type())?);
        resolver.validate(relation, &value)?;
        if let Some(target) = value.identifiers().find(|t| self.get(t).is_none()) {
            return Err(missing(target));
        }

        let resource = self.get_mut(owner)?;
        let previous = resource.relationship(relation).cloned();
        match &value {
            RelationshipValue::ToOne(Some(target)) => resolver.set(resource, relation, target.clone())?,
            RelationshipValue::ToOne(None) => resolver.clear(resource, relation)?,
            RelationshipValue::ToMany(_) => {
                resource.relationships_mut().insert(relation.to_string(), value.clone());
            },
        }

        if let Some(inverse) = declared.inverse() {
            let before: Vec<ResourceIdentifier> =
                previous.iter().flat_map(|v| v.identifiers().cloned()).collect();
            let after: Vec<ResourceIdentifier> = value.identifiers().cloned().collect();
            for removed in before.iter().filter(|t| !after.contains(t)) {
                self.unlink(removed, inverse, owner)?;
            }
            for added in after.iter().filter(|t| !before.contains(t)) {
                self.link_inverse(added, inverse, owner, relation)?;
            }
        }
        Ok(())
    }

    fn add_linkage(
        &mut self,
        owner: &ResourceIdentifier,
        relation: &str,
        targets: &[ResourceIdentifier],
    ) -> Result<()> {
        let mut current = self.current_targets(owner, relation)?;
        for target in targets {
            if !current.contains(target) {
                current.push(target.clone());
            }
        }
        self.replace_linkage(owner, relation, RelationshipValue::ToMany(current))
    }

    fn remove_linkage(
        &mut self,
        owner: &ResourceIdentifier,
        relation: &str,
        targets: &[ResourceIdentifier],
    ) -> Result<()> {
        let mut current = self.current_targets(owner, relation)?;
        current.retain(|t| !targets.contains(t));
        self.replace_linkage(owner, relation, RelationshipValue::ToMany(current))
    }

    /// Binds `target` into `relation` on `owner`: replaces a to-one, appends to a to-many.
    fn link(
        &mut self,
        owner: &ResourceIdentifier,
        relation: &str,
        target: &ResourceIdentifier,
    ) -> Result<()> {
        if self.declared(owner, relation)?.is_to_one() {
            self.replace_linkage(owner, relation, RelationshipValue::to_one(target.clone()))
        } else {
            self.add_linkage(owner, relation, std::slice::from_ref(target))
        }
    }

    fn current_targets(
        &self,
        owner: &ResourceIdentifier,
        relation: &str,
    ) -> Result<Vec<ResourceIdentifier>> {
        let resource = self.get(owner).ok_or_else(|| missing(owner))?;
        Ok(resource
            .relationship(relation)
            .map(|v| v.identifiers().cloned().collect())
            .unwrap_or_default())
    }

    fn unlink(
        &mut self,
        holder: &ResourceIdentifier,
        relation: &str,
        target: &ResourceIdentifier,
    ) -> Result<()> {
        if self.get(holder).is_none() {
            return Ok(());
        }
        if let Some(value) = self.get_mut(holder)?.relationships_mut().get_mut(relation) {
            value.detach(target);
        }
        Ok(())
    }

    /// Points `inverse` on `target` back at `owner`.
    ///
    /// A to-one inverse that was bound elsewhere is moved, and the previous
    /// owner loses its forward link to `target`.
    fn link_inverse(
        &mut self,
        target: &ResourceIdentifier,
        inverse: &str,
        owner: &ResourceIdentifier,
        relation: &str,
    ) -> Result<()> {
        let mirror = self.declared(target, inverse)?;
        let resource = self.get_mut(target)?;
        if mirror.is_to_one() {
            let previous = resource
                .relationships_mut()
                .insert(inverse.to_string(), RelationshipValue::to_one(owner.clone()));
            if let Some(previous_owner) = previous.as_ref().and_then(|v| v.as_to_one()).flatten()
                && previous_owner != owner
            {
                self.unlink(previous_owner, relation, target)?;
            }
        } else {
            let value = resource
                .relationships_mut()
                .entry(inverse.to_string())
                .or_insert_with(|| RelationshipValue::ToMany(Vec::new()));
            if let RelationshipValue::ToMany(members) = value
                && !members.contains(owner)
            {
                members.push(owner.clone());
            }
        }
        Ok(())
    }
}
