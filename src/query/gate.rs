//! The capability gate.
//!
//! Every filter, sort, and page request is checked against the capability
//! descriptors of the types it touches before any data is read. Unsupported
//! requests fail with 400; nothing is silently ignored.

use std::collections::{BTreeMap, BTreeSet};

use super::{Filter, FilterScope, FilterSet, QueryParams, SortKey};
use crate::config::PaginationConfig;
use crate::graph::{PageParams, PageWindow};
use crate::schema::{SchemaRegistry, TypeSchema};
use crate::store::CollectionQuery;
use crate::types::Resource;
use crate::{Error, Result};

/// Whether a response carries one resource or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single resource (or `null`).
    Single,
    /// A collection.
    Collection,
}

/// Query parameters checked against the schema and ready to run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedQuery {
    filters: FilterSet,
    sort: Vec<SortKey>,
    window: Option<PageWindow>,
    totals: bool,
    include: Vec<Vec<String>>,
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl ResolvedQuery {
    /// Per-type filters.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Sort keys.
    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    /// Page window for collection responses.
    pub fn window(&self) -> Option<PageWindow> {
        self.window
    }

    /// Whether `meta.page` totals were requested.
    pub fn totals(&self) -> bool {
        self.totals
    }

    /// Requests totals for a windowed collection. No-op without a window.
    pub(crate) fn force_totals(&mut self) {
        self.totals |= self.window.is_some();
    }

    /// Include paths, split on `.`.
    pub fn include(&self) -> &[Vec<String>] {
        &self.include
    }

    /// The sparse fieldset of `resource_type`, if one was requested.
    pub fn fieldset(&self, resource_type: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(resource_type)
    }

    /// Every `(type, field)` read by the filters and sort keys.
    ///
    /// Sort keys are reported against each of `primary`.
    pub fn queried_fields<'a>(&'a self, primary: &'a [&'a str]) -> Vec<(&'a str, &'a str)> {
        let mut fields = Vec::new();
        for (resource_type, filter) in &self.filters {
            for field in filter.fields() {
                fields.push((resource_type.as_str(), field));
            }
        }
        for key in &self.sort {
            for resource_type in primary {
                fields.push((*resource_type, key.field()));
            }
        }
        fields
    }

    /// Builds a collection query hiding rows for which `visible` is `false`.
    pub fn collection_query<'a>(&'a self, visible: &'a dyn Fn(&Resource) -> bool) -> CollectionQuery<'a> {
        let mut query = CollectionQuery::new()
            .filters(&self.filters)
            .sort(&self.sort)
            .totals(self.totals)
            .visible(visible);
        if let Some(window) = self.window {
            query = query.window(window);
        }
        query
    }
}

/// Checks query parameters against type capabilities.
///
/// ```rust
/// use jsonapi_graph::PaginationConfig;
/// use jsonapi_graph::query::{CapabilityGate, QueryParams, ResponseShape};
/// use jsonapi_graph::schema::{CapabilityDescriptor, SchemaRegistry, TypeSchema};
/// use jsonapi_graph::ErrorKind;
///
/// let schema = SchemaRegistry::builder()
///     .register(TypeSchema::new("tractor").with_capabilities(CapabilityDescriptor::none()))
///     .build()
///     .unwrap();
/// let pagination = PaginationConfig::default();
/// let gate = CapabilityGate::new(&schema, &pagination);
/// let tractor = schema.get("tractor").unwrap();
///
/// let params = QueryParams::parse("filter[tractor]=id==1").unwrap();
/// let err = gate.check(&params, &[tractor], ResponseShape::Collection).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::CapabilityUnsupported);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CapabilityGate<'a> {
    schema: &'a SchemaRegistry,
    pagination: &'a PaginationConfig,
}

impl<'a> CapabilityGate<'a> {
    /// Creates a gate over `schema`.
    pub fn new(schema: &'a SchemaRegistry, pagination: &'a PaginationConfig) -> Self {
        Self { schema, pagination }
    }

    /// Validates `params` for a response whose primary data is of the
    /// `primary` types.
    pub fn check(
        &self,
        params: &QueryParams,
        primary: &[&TypeSchema],
        shape: ResponseShape,
    ) -> Result<ResolvedQuery> {
        let filters = self.check_filters(params, primary)?;
        let sort = self.check_sort(&params.sort, primary)?;
        let (window, totals) = self.check_page(&params.page, primary, shape)?;
        let include = self.check_include(&params.include, primary)?;
        let fields = self.check_fields(&params.fields)?;
        Ok(ResolvedQuery { filters, sort, window, totals, include, fields })
    }

    fn check_filters(&self, params: &QueryParams, primary: &[&TypeSchema]) -> Result<FilterSet> {
        let mut filters = FilterSet::new();
        for (scope, raw) in &params.filters {
            let (parameter, targets) = match scope {
                FilterScope::Primary => ("filter".to_string(), primary.to_vec()),
                FilterScope::Type(resource_type) => {
                    let parameter = format!("filter[{}]", resource_type);
                    let schema = self.schema.get(resource_type).ok_or_else(|| {
                        Error::invalid_argument(format!("unknown type '{}' in filter", resource_type))
                            .with_pointer(parameter.clone())
                    })?;
                    (parameter, vec![schema])
                },
            };

            for target in &targets {
                if !target.capabilities().filterable {
                    return Err(Error::capability_unsupported(format!(
                        "filtering is not supported for type '{}'",
                        target.name()
                    ))
                    .with_pointer(parameter));
                }
            }

            let filter = Filter::parse(raw).map_err(|e| {
                Error::invalid_argument(format!("invalid filter expression: {}", e))
                    .with_pointer(parameter.clone())
                    .with_source(e)
            })?;

            for target in &targets {
                for field in filter.fields() {
                    if field != "id" && target.attribute_kind(field).is_none() {
                        return Err(Error::invalid_argument(format!(
                            "type '{}' has no filterable attribute '{}'",
                            target.name(),
                            field
                        ))
                        .with_pointer(parameter));
                    }
                }
                let merged = match filters.remove(target.name()) {
                    Some(existing) => Filter::And(vec![existing, filter.clone()]),
                    None => filter.clone(),
                };
                filters.insert(target.name().to_string(), merged);
            }
        }
        Ok(filters)
    }

    fn check_sort(&self, keys: &[SortKey], primary: &[&TypeSchema]) -> Result<Vec<SortKey>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        for target in primary {
            if !target.capabilities().sortable {
                return Err(Error::capability_unsupported(format!(
                    "sorting is not supported for type '{}'",
                    target.name()
                ))
                .with_pointer("sort"));
            }
        }
        for key in keys {
            let known = key.field() == "id"
                || primary.iter().any(|t| t.attribute_kind(key.field()).is_some());
            if !known {
                return Err(Error::invalid_argument(format!("unknown sort field '{}'", key.field()))
                    .with_pointer("sort"));
            }
        }
        Ok(keys.to_vec())
    }

    fn check_page(
        &self,
        page: &PageParams,
        primary: &[&TypeSchema],
        shape: ResponseShape,
    ) -> Result<(Option<PageWindow>, bool)> {
        if shape == ResponseShape::Single {
            return Ok((None, false));
        }
        let paginatable = primary.iter().all(|t| t.capabilities().paginatable);
        if !paginatable {
            if page.is_requested() {
                let name = primary
                    .iter()
                    .find(|t| !t.capabilities().paginatable)
                    .map_or("", |t| t.name());
                return Err(Error::capability_unsupported(format!(
                    "pagination is not supported for type '{}'",
                    name
                ))
                .with_pointer("page"));
            }
            return Ok((None, false));
        }
        let window = page.resolve(self.pagination)?;
        Ok((Some(window), page.totals))
    }

    fn check_include(&self, paths: &[String], primary: &[&TypeSchema]) -> Result<Vec<Vec<String>>> {
        let mut resolved = Vec::new();
        for path in paths {
            let segments: Vec<String> = path.split('.').map(str::to_string).collect();
            let mut cursor: Vec<&TypeSchema> = primary.to_vec();
            for segment in &segments {
                let mut next: Vec<&TypeSchema> = Vec::new();
                let mut found = false;
                for schema in &cursor {
                    if let Some(relationship) = schema.relationship(segment) {
                        found = true;
                        for target in relationship.targets() {
                            if let Some(target) = self.schema.get(target)
                                && !next.iter().any(|t| t.name() == target.name())
                            {
                                next.push(target);
                            }
                        }
                    }
                }
                if segment.is_empty() || !found {
                    return Err(Error::invalid_argument(format!(
                        "unknown relationship '{}' in include path '{}'",
                        segment, path
                    ))
                    .with_pointer("include"));
                }
                cursor = next;
            }
            if !resolved.contains(&segments) {
                resolved.push(segments);
            }
        }
        Ok(resolved)
    }

    fn check_fields(
        &self,
        fields: &BTreeMap<String, Vec<String>>,
    ) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut resolved = BTreeMap::new();
        for (resource_type, names) in fields {
            let parameter = format!("fields[{}]", resource_type);
            let schema = self.schema.get(resource_type).ok_or_else(|| {
                Error::invalid_argument(format!("unknown type '{}' in sparse fieldset", resource_type))
                    .with_pointer(parameter.clone())
            })?;
            for name in names {
                if !schema.has_field(name) {
                    return Err(Error::invalid_argument(format!(
                        "type '{}' has no field '{}'",
                        resource_type, name
                    ))
                    .with_pointer(parameter));
                }
            }
            resolved.insert(resource_type.clone(), names.iter().cloned().collect());
        }
        Ok(resolved)
    }
}
