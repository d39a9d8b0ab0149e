//! Page windows over collections.
//!
//! Two request styles are accepted, never mixed:
//!
//! ```text
//! page[number]=2&page[size]=10      -> offset 10, limit 10
//! page[offset]=5&page[limit]=20     -> offset 5,  limit 20
//! page[totals]                      -> default window, totals requested
//! ```

use serde::Serialize;

use crate::config::PaginationConfig;
use crate::{Error, Result};

/// The raw `page[...]` parameters of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    /// `page[number]`, 1-based.
    pub number: Option<String>,
    /// `page[size]`.
    pub size: Option<String>,
    /// `page[offset]`, 0-based.
    pub offset: Option<String>,
    /// `page[limit]`.
    pub limit: Option<String>,
    /// Whether `page[totals]` was present.
    pub totals: bool,
}

impl PageParams {
    /// Returns `true` if any `page[...]` parameter was given.
    pub fn is_requested(&self) -> bool {
        self.number.is_some()
            || self.size.is_some()
            || self.offset.is_some()
            || self.limit.is_some()
            || self.totals
    }

    /// Resolves the parameters into a window.
    ///
    /// ```rust
    /// use jsonapi_graph::PaginationConfig;
    /// use jsonapi_graph::graph::PageParams;
    ///
    /// let params = PageParams { number: Some("3".into()), size: Some("10".into()), ..Default::default() };
    /// let window = params.resolve(&PaginationConfig::default()).unwrap();
    /// assert_eq!((window.offset(), window.limit()), (20, 10));
    ///
    /// let mixed = PageParams { number: Some("1".into()), limit: Some("5".into()), ..Default::default() };
    /// assert!(mixed.resolve(&PaginationConfig::default()).is_err());
    /// ```
    pub fn resolve(&self, config: &PaginationConfig) -> Result<PageWindow> {
        let paged = self.number.is_some() || self.size.is_some();
        let offset_style = self.offset.is_some() || self.limit.is_some();
        if paged && offset_style {
            return Err(Error::invalid_argument(
                "page[number]/page[size] cannot be combined with page[offset]/page[limit]",
            )
            .with_pointer("page"));
        }

        if offset_style {
            let offset = match &self.offset {
                Some(raw) => parse_count("page[offset]", raw, true)?,
                None => 0,
            };
            let limit = self.limit_or_default("page[limit]", self.limit.as_deref(), config)?;
            return Ok(PageWindow { offset, limit });
        }

        let size = self.limit_or_default("page[size]", self.size.as_deref(), config)?;
        let number = match &self.number {
            Some(raw) => parse_count("page[number]", raw, false)?,
            None => 1,
        };
        let offset = (number - 1).checked_mul(size).ok_or_else(|| {
            Error::invalid_argument(format!("page[number]={} is out of range", number))
                .with_pointer("page[number]")
        })?;
        Ok(PageWindow { offset, limit: size })
    }

    fn limit_or_default(
        &self,
        parameter: &'static str,
        raw: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<usize> {
        let Some(raw) = raw else {
            return Ok(config.default_page_size);
        };
        let limit = parse_count(parameter, raw, false)?;
        if limit > config.max_page_size {
            return Err(Error::invalid_argument(format!(
                "{}={} exceeds the maximum page size of {}",
                parameter, limit, config.max_page_size
            ))
            .with_pointer(parameter));
        }
        Ok(limit)
    }
}

fn parse_count(parameter: &'static str, raw: &str, allow_zero: bool) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) if !allow_zero => Err(Error::invalid_argument(format!("{} must be positive", parameter))
            .with_pointer(parameter)),
        Ok(value) => Ok(value),
        Err(e) => Err(Error::invalid_argument(format!(
            "{} must be a non-negative integer, got '{}'",
            parameter, raw
        ))
        .with_pointer(parameter)
        .with_source(e)),
    }
}

/// A resolved `[offset, offset + limit)` slice of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    offset: usize,
    limit: usize,
}

impl PageWindow {
    /// Creates a window. A zero limit is raised to one.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit: limit.max(1) }
    }

    /// Returns the 0-based offset of the first row.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the maximum number of rows.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the 1-based page number containing the first row.
    pub fn number(&self) -> usize {
        self.offset / self.limit + 1
    }

    /// Cuts the window out of `rows`.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().skip(self.offset).take(self.limit).collect()
    }

    /// Builds the `meta.page` block for a collection of `total` rows.
    pub fn meta(&self, total: usize) -> PageMeta {
        PageMeta {
            number: self.number(),
            limit: self.limit,
            total_pages: total.div_ceil(self.limit),
            total_records: total,
        }
    }
}

/// The `meta.page` block of a collection response.
///
/// ```rust
/// use jsonapi_graph::graph::PageWindow;
/// use serde_json::json;
///
/// let meta = PageWindow::new(0, 10).meta(23);
/// assert_eq!(
///     serde_json::to_value(meta).unwrap(),
///     json!({"number": 1, "limit": 10, "totalPages": 3, "totalRecords": 23})
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// 1-based page number.
    pub number: usize,
    /// Page size.
    pub limit: usize,
    /// Number of pages at this size.
    pub total_pages: usize,
    /// Number of rows across all pages.
    pub total_records: usize,
}
