//! The resource graph: relationship resolution and pagination.

mod pagination;
mod resolver;

pub use pagination::{PageMeta, PageParams, PageWindow};
pub use resolver::RelationshipResolver;
