//! Path parsing.
//!
//! Paths are split into percent-decoded segments and classified by shape
//! only; whether the named types and relationships exist is decided later
//! against the schema.

use crate::{Error, Result};

/// One `relationship/id` hop below the root resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hop {
    pub(crate) relation: String,
    pub(crate) id: String,
}

/// The root resource and the hops walked from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chain {
    pub(crate) root_type: String,
    pub(crate) root_id: String,
    pub(crate) hops: Vec<Hop>,
}

/// What a path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    /// `/type`
    Collection { resource_type: String },
    /// `/type/id`, or a member reached through relationships.
    Resource { chain: Chain },
    /// `/type/id/rel`: the related resource or collection.
    Related { owner: Chain, relation: String },
    /// `/type/id/relationships/rel`: bare linkage.
    Relationship { owner: Chain, relation: String },
}

impl Route {
    pub(crate) fn parse(path: &str) -> Result<Self> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s).map(|s| s.into_owned()).map_err(|e| {
                    Error::not_found(format!("path segment '{}' is not valid UTF-8", s)).with_source(e)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (resource_type, rest) = match segments.split_first() {
            Some(first) => first,
            None => return Err(Error::not_found("no resource type in path")),
        };
        let Some((root_id, mut rest)) = rest.split_first() else {
            return Ok(Route::Collection { resource_type: resource_type.clone() });
        };

        let mut chain = Chain { root_type: resource_type.clone(), root_id: root_id.clone(), hops: Vec::new() };
        loop {
            match rest {
                [] => return Ok(Route::Resource { chain }),
                [relation] => return Ok(Route::Related { owner: chain, relation: relation.clone() }),
                [keyword, relation] if keyword == "relationships" => {
                    return Ok(Route::Relationship { owner: chain, relation: relation.clone() });
                },
                [relation, id, tail @ ..] => {
                    chain.hops.push(Hop { relation: relation.clone(), id: id.clone() });
                    rest = tail;
                },
            }
        }
    }
}
