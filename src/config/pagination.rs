//! Pagination configuration for collection responses.

use crate::{Error, Result};

/// Configuration for `page[...]` windows on collections.
///
/// ## Default Values
///
/// - `default_page_size`: 500
/// - `max_page_size`: 10000
///
/// ## Example
///
/// ```rust
/// use jsonapi_graph::PaginationConfig;
///
/// let config = PaginationConfig::builder()
///     .default_page_size(20)
///     .max_page_size(100)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct PaginationConfig {
    /// Page size used when a request names a page but no size.
    #[builder(default = 500)]
    pub default_page_size: usize,

    /// Largest `page[size]` or `page[limit]` a request may ask for.
    ///
    /// Larger values are rejected with 400, not clamped.
    #[builder(default = 10_000)]
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PaginationConfig {
    /// Checks that the sizes are positive and consistent.
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(Error::configuration("page sizes must be positive"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(Error::configuration(format!(
                "default page size {} exceeds maximum {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}
