//! Engine-wide configuration.

use std::fmt;

use super::PaginationConfig;
use crate::Result;

/// How the bundled store assigns ids to created resources.
///
/// Ids are unique within a type only; `tractor/1` and `smartphone/1` are
/// distinct resources under either strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdStrategy {
    /// A per-type counter starting at `1`.
    #[default]
    Sequential,
    /// A random version 4 UUID.
    Uuid,
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdStrategy::Sequential => write!(f, "sequential"),
            IdStrategy::Uuid => write!(f, "uuid"),
        }
    }
}

/// Top-level configuration for [`JsonApi`](crate::JsonApi).
///
/// ## Example
///
/// ```rust
/// use jsonapi_graph::{EngineConfig, IdStrategy, PaginationConfig};
///
/// let config = EngineConfig::builder()
///     .id_strategy(IdStrategy::Uuid)
///     .pagination(PaginationConfig::builder().default_page_size(25).build())
///     .build();
///
/// assert_eq!(config.pagination.default_page_size, 25);
/// assert_eq!(config.id_strategy, IdStrategy::Uuid);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct EngineConfig {
    /// Id assignment for resources created through the bundled store.
    #[builder(default)]
    pub id_strategy: IdStrategy,

    /// Collection pagination limits.
    #[builder(default)]
    pub pagination: PaginationConfig,

    /// Whether collection responses always carry `meta.page`, even without
    /// `page[totals]`.
    #[builder(default = false)]
    pub always_page_meta: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Checks every nested section.
    pub fn validate(&self) -> Result<()> {
        self.pagination.validate()
    }
}
