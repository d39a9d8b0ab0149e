//! Routing and per-route handlers.
//!
//! Every request goes through the same steps, in order:
//!
//! 1. The path is parsed and checked against the schema (404 for unknown
//!    root types and relationships, 405 for unsupported methods).
//! 2. Query parameters go through the capability gate (400).
//! 3. Filter and sort fields are checked for field-level read permission.
//! 4. The addressed resources are loaded and the operation authorized.
//! 5. The store is called and the result rendered.

use serde::Deserialize;

use super::route::{Chain, Route};
use super::{JsonApi, Method, Request, Response};
use crate::document::{Document, LinkageIntent, Serializer, parse_create, parse_linkage, parse_patch, to_json};
use crate::graph::RelationshipResolver;
use crate::permission::{Action, Target};
use crate::query::{CapabilityGate, QueryParams, ResolvedQuery, ResponseShape};
use crate::schema::TypeSchema;
use crate::store::{Attachment, ResourcePatch};
use crate::types::{Principal, RelationshipValue, Resource, ResourceIdentifier};
use crate::{Error, Result};

/// What the schema says about a route before any data is read.
struct Plan<'s> {
    primary: Vec<&'s TypeSchema>,
    shape: ResponseShape,
    to_one: bool,
}

/// Per-request state shared by the handlers.
struct Context<'r> {
    principal: &'r Principal,
    query: &'r ResolvedQuery,
    body: Option<&'r str>,
}

impl<'r> Context<'r> {
    fn body(&self) -> Result<&'r str> {
        self.body.ok_or_else(|| Error::invalid_document("request body is required"))
    }
}

/// Just enough of a create body to pick the target type.
#[derive(Deserialize)]
struct TypeHeader {
    data: HeaderData,
}

#[derive(Deserialize)]
struct HeaderData {
    #[serde(rename = "type")]
    resource_type: String,
}

impl JsonApi {
    pub(super) fn dispatch(&self, request: &Request) -> Result<Response> {
        let route = Route::parse(request.path())?;
        let plan = self.plan(&route)?;
        check_method(&route, request.method(), plan.to_one)?;

        let params = QueryParams::parse(request.query())?;
        let gate = CapabilityGate::new(&self.schema, &self.config.pagination);
        let mut query = gate.check(&params, &plan.primary, plan.shape)?;
        if self.config.always_page_meta {
            query.force_totals();
        }

        let principal = request.principal();
        let names: Vec<&str> = plan.primary.iter().map(|t| t.name()).collect();
        for (resource_type, field) in query.queried_fields(&names) {
            if field != "id" {
                self.permissions.authorize_field(Action::Read, principal, resource_type, field)?;
            }
        }

        let ctx = Context { principal, query: &query, body: request.body() };
        match (route, request.method()) {
            (Route::Collection { resource_type }, Method::Get) => self.get_collection(&ctx, &resource_type),
            (Route::Collection { resource_type }, Method::Post) => self.create(&ctx, &resource_type),
            (Route::Resource { chain }, Method::Get) => self.get_resource(&ctx, &chain),
            (Route::Resource { chain }, Method::Patch) => self.update(&ctx, &chain),
            (Route::Resource { chain }, Method::Delete) => self.delete(&ctx, &chain),
            (Route::Related { owner, relation }, Method::Get) => self.get_related(&ctx, &owner, &relation),
            (Route::Related { owner, relation }, Method::Post) => self.create_related(&ctx, &owner, &relation),
            (Route::Relationship { owner, relation }, Method::Get) => self.get_linkage(&ctx, &owner, &relation),
            (Route::Relationship { owner, relation }, Method::Patch) => {
                self.change_linkage(&ctx, &owner, &relation, LinkageIntent::Replace)
            },
            (Route::Relationship { owner, relation }, Method::Post) => {
                self.change_linkage(&ctx, &owner, &relation, LinkageIntent::Add)
            },
            (Route::Relationship { owner, relation }, Method::Delete) => {
                self.change_linkage(&ctx, &owner, &relation, LinkageIntent::Remove)
            },
            (_, method) => Err(method_not_allowed(method)),
        }
    }

    fn plan(&self, route: &Route) -> Result<Plan<'_>> {
        match route {
            Route::Collection { resource_type } => Ok(Plan {
                primary: vec![self.root_type(resource_type)?],
                shape: ResponseShape::Collection,
                to_one: false,
            }),
            Route::Resource { chain } => {
                Ok(Plan { primary: self.chain_types(chain)?, shape: ResponseShape::Single, to_one: false })
            },
            Route::Related { owner, relation } => {
                let (primary, to_one) = self.related_types(&self.chain_types(owner)?, relation)?;
                let shape = if to_one { ResponseShape::Single } else { ResponseShape::Collection };
                Ok(Plan { primary, shape, to_one })
            },
            Route::Relationship { owner, relation } => {
                let (primary, to_one) = self.related_types(&self.chain_types(owner)?, relation)?;
                Ok(Plan { primary, shape: ResponseShape::Single, to_one })
            },
        }
    }

    fn root_type(&self, resource_type: &str) -> Result<&TypeSchema> {
        match self.schema.get(resource_type) {
            Some(schema) if schema.is_root_level() => Ok(schema),
            _ => Err(Error::not_found(format!("no root-level type '{}'", resource_type))),
        }
    }

    /// Every type a chain may end on.
    fn chain_types(&self, chain: &Chain) -> Result<Vec<&TypeSchema>> {
        let mut types = vec![self.root_type(&chain.root_type)?];
        for hop in &chain.hops {
            types = self.related_types(&types, &hop.relation)?.0;
        }
        Ok(types)
    }

    /// Target types of `relation` across `owners`, and whether it is to-one.
    fn related_types<'s>(
        &'s self,
        owners: &[&'s TypeSchema],
        relation: &str,
    ) -> Result<(Vec<&'s TypeSchema>, bool)> {
        let mut targets: Vec<&TypeSchema> = Vec::new();
        let mut to_one = None;
        for owner in owners {
            let Some(declared) = owner.relationship(relation) else {
                continue;
            };
            to_one.get_or_insert(declared.is_to_one());
            for target in declared.targets() {
                if let Some(target) = self.schema.get(target)
                    && !targets.iter().any(|t| t.name() == target.name())
                {
                    targets.push(target);
                }
            }
        }
        match to_one {
            Some(to_one) => Ok((targets, to_one)),
            None => Err(Error::not_found(format!("no relationship '{}'", relation))),
        }
    }

    fn serializer<'a>(&'a self, ctx: &'a Context<'_>) -> Serializer<'a> {
        Serializer::new(&self.schema, &self.permissions, self.store.as_ref(), ctx.principal, ctx.query)
    }

    /// Reads a resource the principal may read.
    fn load(&self, principal: &Principal, identifier: &ResourceIdentifier) -> Result<Resource> {
        let resource = self
            .store
            .read(identifier)?
            .ok_or_else(|| Error::not_found(format!("resource '{}' does not exist", identifier)))?;
        self.permissions.authorize(Action::Read, principal, &Target::entity(&resource))?;
        Ok(resource)
    }

    /// Loads the resource a chain ends on, checking read access at every hop.
    fn walk(&self, principal: &Principal, chain: &Chain) -> Result<Resource> {
        let root = ResourceIdentifier::new(chain.root_type.as_str(), chain.root_id.as_str());
        let mut current = self.load(principal, &root)?;
        for hop in &chain.hops {
            let schema = self.declaring_schema(&current, &hop.relation)?;
            self.permissions.authorize(Action::Read, principal, &Target::field(&current, &hop.relation))?;
            let resolver = RelationshipResolver::new(schema);
            let linkage = resolver.linkage(&current, &hop.relation)?;
            let Some(target) = linkage.identifiers().find(|t| t.id() == hop.id).cloned() else {
                return Err(Error::not_found(format!(
                    "'{}' has no '{}' member with id '{}'",
                    current.identifier(),
                    hop.relation,
                    hop.id
                )));
            };
            let referent = resolver.resolve(self.store.as_ref(), &target)?;
            self.permissions.authorize(Action::Read, principal, &Target::entity(&referent))?;
            current = referent;
        }
        Ok(current)
    }

    /// The schema of `owner`, provided its concrete type declares `relation`.
    fn declaring_schema(&self, owner: &Resource, relation: &str) -> Result<&TypeSchema> {
        let schema = self.schema.require(owner.resource_type())?;
        if schema.relationship(relation).is_none() {
            return Err(Error::not_found(format!(
                "type '{}' has no relationship '{}'",
                owner.resource_type(),
                relation
            )));
        }
        Ok(schema)
    }

    fn authorize_write<'f>(
        &self,
        action: Action,
        principal: &Principal,
        resource: &Resource,
        fields: impl IntoIterator<Item = &'f str>,
    ) -> Result<()> {
        self.permissions.authorize(action, principal, &Target::entity(resource))?;
        for field in fields {
            self.permissions.authorize(action, principal, &Target::field(resource, field))?;
        }
        Ok(())
    }

    fn get_collection(&self, ctx: &Context<'_>, resource_type: &str) -> Result<Response> {
        let serializer = self.serializer(ctx);
        let visible = |resource: &Resource| serializer.can_read(resource);
        let collection = self.store.list(resource_type, &ctx.query.collection_query(&visible))?;
        let page = collection.page_meta(ctx.query.window());
        ok(&serializer.collection(&collection.resources, page)?)
    }

    fn create(&self, ctx: &Context<'_>, resource_type: &str) -> Result<Response> {
        let schema = self.root_type(resource_type)?;
        let draft = parse_create(ctx.body()?, schema)?;
        self.authorize_write(Action::Create, ctx.principal, &draft, supplied_fields(&draft))?;
        let created = self.store.create(draft, None)?;
        created_response(&self.serializer(ctx).single(Some(&created))?)
    }

    fn get_resource(&self, ctx: &Context<'_>, chain: &Chain) -> Result<Response> {
        let resource = self.walk(ctx.principal, chain)?;
        ok(&self.serializer(ctx).single(Some(&resource))?)
    }

    fn update(&self, ctx: &Context<'_>, chain: &Chain) -> Result<Response> {
        let current = self.walk(ctx.principal, chain)?;
        let schema = self.schema.require(current.resource_type())?;
        let patch = parse_patch(ctx.body()?, current.identifier(), schema)?;
        self.authorize_write(Action::Update, ctx.principal, &current, patch.fields())?;
        self.store.patch(&patch)?;
        Ok(Response::no_content())
    }

    fn delete(&self, ctx: &Context<'_>, chain: &Chain) -> Result<Response> {
        let current = self.walk(ctx.principal, chain)?;
        self.permissions.authorize(Action::Delete, ctx.principal, &Target::entity(&current))?;
        self.store.delete(current.identifier())?;
        Ok(Response::no_content())
    }

    fn get_related(&self, ctx: &Context<'_>, owner: &Chain, relation: &str) -> Result<Response> {
        let owner = self.walk(ctx.principal, owner)?;
        let schema = self.declaring_schema(&owner, relation)?;
        self.permissions.authorize(Action::Read, ctx.principal, &Target::field(&owner, relation))?;

        let serializer = self.serializer(ctx);
        let resolver = RelationshipResolver::new(schema);
        let document = match resolver.linkage(&owner, relation)? {
            RelationshipValue::ToOne(target) => {
                let related = match target {
                    Some(target) => Some(resolver.resolve(self.store.as_ref(), &target)?)
                        .filter(|referent| serializer.can_read(referent)),
                    None => None,
                };
                serializer.single(related.as_ref())?
            },
            RelationshipValue::ToMany(targets) => {
                let rows = targets
                    .iter()
                    .map(|target| resolver.resolve(self.store.as_ref(), target))
                    .collect::<Result<Vec<_>>>()?;
                let visible = |resource: &Resource| serializer.can_read(resource);
                let collection = ctx.query.collection_query(&visible).run(rows);
                serializer.collection(&collection.resources, collection.page_meta(ctx.query.window()))?
            },
        };
        ok(&document)
    }

    fn create_related(&self, ctx: &Context<'_>, owner: &Chain, relation: &str) -> Result<Response> {
        let owner = self.walk(ctx.principal, owner)?;
        let owner_schema = self.declaring_schema(&owner, relation)?;
        let declared = RelationshipResolver::new(owner_schema).declared(relation)?;

        let body = ctx.body()?;
        let header: TypeHeader = serde_json::from_str(body)?;
        let resource_type = header.data.resource_type;
        if !declared.permits(&resource_type) {
            return Err(Error::invalid_relation_type(format!(
                "'{}.{}' does not accept type '{}'",
                owner.resource_type(),
                relation,
                resource_type
            ))
            .with_pointer("/data/type"));
        }

        let schema = self.schema.require(&resource_type)?;
        let draft = parse_create(body, schema)?;
        self.authorize_write(Action::Create, ctx.principal, &draft, supplied_fields(&draft))?;
        self.permissions.authorize(Action::Update, ctx.principal, &Target::field(&owner, relation))?;

        let attachment = Attachment::new(owner.identifier().clone(), relation);
        let created = self.store.create(draft, Some(&attachment))?;
        created_response(&self.serializer(ctx).single(Some(&created))?)
    }

    fn get_linkage(&self, ctx: &Context<'_>, owner: &Chain, relation: &str) -> Result<Response> {
        let owner = self.walk(ctx.principal, owner)?;
        self.declaring_schema(&owner, relation)?;
        self.permissions.authorize(Action::Read, ctx.principal, &Target::field(&owner, relation))?;
        ok(&self.serializer(ctx).linkage(&owner, relation)?)
    }

    fn change_linkage(
        &self,
        ctx: &Context<'_>,
        owner: &Chain,
        relation: &str,
        intent: LinkageIntent,
    ) -> Result<Response> {
        let owner = self.walk(ctx.principal, owner)?;
        let schema = self.declaring_schema(&owner, relation)?;
        self.permissions.authorize(Action::Update, ctx.principal, &Target::field(&owner, relation))?;
        let change = parse_linkage(ctx.body()?, &RelationshipResolver::new(schema), relation, intent)?;
        self.store.patch(&ResourcePatch::new(owner.identifier().clone()).with_linkage(relation, change))?;
        Ok(Response::no_content())
    }
}

fn check_method(route: &Route, method: Method, to_one: bool) -> Result<()> {
    let allowed = match route {
        Route::Collection { .. } | Route::Related { .. } => matches!(method, Method::Get | Method::Post),
        Route::Resource { .. } => matches!(method, Method::Get | Method::Patch | Method::Delete),
        Route::Relationship { .. } => match method {
            Method::Get | Method::Patch => true,
            Method::Post | Method::Delete => !to_one,
        },
    };
    if allowed { Ok(()) } else { Err(method_not_allowed(method)) }
}

fn method_not_allowed(method: Method) -> Error {
    Error::method_not_allowed(format!("{} is not supported on this path", method))
}

fn supplied_fields(draft: &Resource) -> impl Iterator<Item = &str> {
    draft.attributes().keys().chain(draft.relationships().keys()).map(String::as_str)
}

fn ok(document: &Document) -> Result<Response> {
    Ok(Response::ok(to_json(document)?))
}

fn created_response(document: &Document) -> Result<Response> {
    Ok(Response::created(to_json(document)?))
}
