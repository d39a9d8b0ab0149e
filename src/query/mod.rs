//! Query parameters: parsing, filter expressions, sorting, and the
//! capability gate.
//!
//! A request's query string goes through three steps:
//!
//! 1. [`QueryParams::parse`] splits it into parameter families.
//! 2. [`CapabilityGate::check`] validates them against the schema.
//! 3. The resulting [`ResolvedQuery`] drives the collection query.

mod filter;
mod gate;
mod params;
mod sort;

use std::collections::BTreeMap;

pub use filter::{Comparison, Filter, FilterError, MAX_FILTER_DEPTH, MAX_FILTER_LENGTH, Operator};
pub use gate::{CapabilityGate, ResolvedQuery, ResponseShape};
pub use params::{FilterScope, QueryParams};
pub use sort::{SortKey, compare_resources};

/// Filters keyed by the resource type they apply to.
pub type FilterSet = BTreeMap<String, Filter>;
