//! Collection queries: filter, visibility, sort, window, totals.

use std::fmt;

use crate::graph::{PageMeta, PageWindow};
use crate::query::{FilterSet, SortKey, compare_resources};
use crate::types::Resource;

/// How to narrow and order a collection.
///
/// Filters are keyed by resource type, so one query can narrow a
/// polymorphic collection member by member. The visibility predicate runs
/// before counting and windowing, which keeps pages full and totals honest
/// when some rows are hidden from the caller.
#[derive(Clone, Copy, Default)]
pub struct CollectionQuery<'a> {
    filters: Option<&'a FilterSet>,
    sort: &'a [SortKey],
    window: Option<PageWindow>,
    totals: bool,
    visible: Option<&'a dyn Fn(&Resource) -> bool>,
}

impl<'a> CollectionQuery<'a> {
    /// A query returning every row in store order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrows rows by per-type filters.
    #[must_use]
    pub fn filters(mut self, filters: &'a FilterSet) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Orders rows by `keys`. Ties keep store order.
    #[must_use]
    pub fn sort(mut self, keys: &'a [SortKey]) -> Self {
        self.sort = keys;
        self
    }

    /// Returns only the rows inside `window`.
    #[must_use]
    pub fn window(mut self, window: PageWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Requests the total row count.
    #[must_use]
    pub fn totals(mut self, totals: bool) -> Self {
        self.totals = totals;
        self
    }

    /// Hides rows for which `visible` returns `false`.
    #[must_use]
    pub fn visible(mut self, visible: &'a dyn Fn(&Resource) -> bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Returns the requested window, if any.
    pub fn page_window(&self) -> Option<PageWindow> {
        self.window
    }

    /// Runs the query over `rows`, which must be in store order.
    pub fn run(&self, rows: impl IntoIterator<Item = Resource>) -> Collection {
        let mut rows: Vec<Resource> = rows
            .into_iter()
            .filter(|row| match self.filters.and_then(|f| f.get(row.resource_type())) {
                Some(filter) => filter.matches(row),
                None => true,
            })
            .filter(|row| self.visible.is_none_or(|visible| visible(row)))
            .collect();

        if !self.sort.is_empty() {
            rows.sort_by(|a, b| compare_resources(a, b, self.sort));
        }

        let total = self.totals.then_some(rows.len());
        let resources = match self.window {
            Some(window) => window.apply(rows),
            None => rows,
        };
        Collection { resources, total }
    }
}

impl fmt::Debug for CollectionQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionQuery")
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("window", &self.window)
            .field("totals", &self.totals)
            .field("visible", &self.visible.is_some())
            .finish()
    }
}

/// One page of a collection, plus the total when it was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    /// Rows in the requested window.
    pub resources: Vec<Resource>,
    /// Row count across all pages; `None` unless requested.
    pub total: Option<usize>,
}

impl Collection {
    /// Builds `meta.page` when a total was computed.
    pub fn page_meta(&self, window: Option<PageWindow>) -> Option<PageMeta> {
        let total = self.total?;
        let window = window.unwrap_or_else(|| PageWindow::new(0, total.max(1)));
        Some(window.meta(total))
    }
}
