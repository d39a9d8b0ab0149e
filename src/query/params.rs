//! Query string parsing.

use std::collections::BTreeMap;

use super::SortKey;
use crate::graph::PageParams;
use crate::{Error, Result};

/// Which types a `filter` parameter applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterScope {
    /// Bare `filter=...`: the primary type of the request.
    Primary,
    /// `filter[<type>]=...`.
    Type(String),
}

/// The recognised query parameters of a request, unvalidated.
///
/// ```rust
/// use jsonapi_graph::query::{FilterScope, QueryParams, SortKey};
///
/// let params = QueryParams::parse(
///     "include=myStuff&fields[tractor]=horsepower&filter[tractor]=horsepower%3E%3D100&sort=-id&page[totals]",
/// )
/// .unwrap();
///
/// assert_eq!(params.include, vec!["myStuff"]);
/// assert_eq!(params.fields["tractor"], vec!["horsepower"]);
/// assert_eq!(params.filters[&FilterScope::Type("tractor".into())], "horsepower>=100");
/// assert_eq!(params.sort, vec![SortKey::descending("id")]);
/// assert!(params.page.totals);
///
/// assert!(QueryParams::parse("colour=red").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// `include` paths, dotted, in request order.
    pub include: Vec<String>,
    /// `fields[<type>]` sparse fieldsets.
    pub fields: BTreeMap<String, Vec<String>>,
    /// Raw filter expressions by scope.
    pub filters: BTreeMap<FilterScope, String>,
    /// `sort` keys in priority order.
    pub sort: Vec<SortKey>,
    /// `page[...]` parameters.
    pub page: PageParams,
}

impl QueryParams {
    /// Parses a raw, percent-encoded query string (without the leading `?`).
    ///
    /// Unknown parameter families are rejected with 400.
    pub fn parse(query: &str) -> Result<Self> {
        let mut params = QueryParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(&key, &value)?;
        }
        Ok(params)
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        if key == "include" {
            self.include.extend(split_list(value).map(str::to_string));
        } else if key == "sort" {
            for raw in value.split(',') {
                let sort = SortKey::parse(raw).ok_or_else(|| {
                    Error::invalid_argument(format!("invalid sort key '{}'", raw)).with_pointer("sort")
                })?;
                self.sort.push(sort);
            }
        } else if key == "filter" {
            self.insert_filter(FilterScope::Primary, key, value)?;
        } else if let Some(resource_type) = bracketed(key, "filter") {
            self.insert_filter(FilterScope::Type(resource_type.to_string()), key, value)?;
        } else if let Some(resource_type) = bracketed(key, "fields") {
            self.fields
                .entry(resource_type.to_string())
                .or_default()
                .extend(split_list(value).map(str::to_string));
        } else if let Some(name) = bracketed(key, "page") {
            let slot = match name {
                "number" => &mut self.page.number,
                "size" => &mut self.page.size,
                "offset" => &mut self.page.offset,
                "limit" => &mut self.page.limit,
                "totals" => {
                    self.page.totals = true;
                    return Ok(());
                },
                _ => {
                    return Err(Error::invalid_argument(format!(
                        "unsupported pagination parameter '{}'",
                        key
                    ))
                    .with_pointer(key.to_string()));
                },
            };
            *slot = Some(value.to_string());
        } else {
            return Err(Error::invalid_argument(format!("unsupported query parameter '{}'", key))
                .with_pointer(key.to_string()));
        }
        Ok(())
    }

    fn insert_filter(&mut self, scope: FilterScope, key: &str, value: &str) -> Result<()> {
        if self.filters.contains_key(&scope) {
            return Err(Error::invalid_argument(format!("'{}' given more than once", key))
                .with_pointer(key.to_string()));
        }
        self.filters.insert(scope, value.to_string());
        Ok(())
    }

    /// Returns `true` if no parameter was given.
    pub fn is_empty(&self) -> bool {
        *self == QueryParams::default()
    }
}

/// Extracts `inner` from `family[inner]`.
fn bracketed<'k>(key: &'k str, family: &str) -> Option<&'k str> {
    let inner = key.strip_prefix(family)?.strip_prefix('[')?.strip_suffix(']')?;
    (!inner.is_empty()).then_some(inner)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
