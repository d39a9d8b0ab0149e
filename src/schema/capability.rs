//! Per-type query capability flags.

/// Which query features a type supports.
///
/// Types reachable only as polymorphic targets commonly turn filtering and
/// sorting off. Requests using a disabled feature are rejected with 400; they
/// are never silently ignored.
///
/// ```rust
/// use jsonapi_graph::schema::CapabilityDescriptor;
///
/// let full = CapabilityDescriptor::default();
/// assert!(full.filterable && full.sortable && full.paginatable);
///
/// let opaque = CapabilityDescriptor::builder().filterable(false).sortable(false).build();
/// assert!(!opaque.filterable);
/// assert!(opaque.paginatable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct CapabilityDescriptor {
    /// Whether `filter[...]` may target this type.
    #[builder(default = true)]
    pub filterable: bool,

    /// Whether `sort` may target this type.
    #[builder(default = true)]
    pub sortable: bool,

    /// Whether collections of this type accept `page[...]` windows.
    #[builder(default = true)]
    pub paginatable: bool,
}

impl Default for CapabilityDescriptor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CapabilityDescriptor {
    /// A descriptor with every feature disabled.
    pub fn none() -> Self {
        Self { filterable: false, sortable: false, paginatable: false }
    }
}
