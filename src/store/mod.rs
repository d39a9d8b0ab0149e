//! Persistence behind the engine.
//!
//! [`DataStore`] is the seam between request handling and storage.
//! [`InMemoryStore`] is the bundled implementation.

mod collection;
mod in_memory;
mod patch;

pub use collection::{Collection, CollectionQuery};
pub use in_memory::InMemoryStore;
pub use patch::{Attachment, LinkageChange, ResourcePatch};

use crate::Result;
use crate::types::{Resource, ResourceIdentifier};

/// Storage for resources.
///
/// Implementations must keep these guarantees:
/// - Every write is atomic: a failed write leaves no partial change behind.
/// - Every linkage a write introduces names an existing resource; otherwise
///   the write fails with [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
/// - Inverse relationships declared in the schema stay in step.
/// - Reads return snapshots; a `(type, id)` linkage is never observed half
///   written.
pub trait DataStore: Send + Sync {
    /// Stores `draft` under a fresh id and returns the stored resource.
    ///
    /// Any id on the draft is ignored. With `attach`, the new resource is
    /// linked into the owner's relationship in the same write.
    fn create(&self, draft: Resource, attach: Option<&Attachment>) -> Result<Resource>;

    /// Reads one resource.
    fn read(&self, identifier: &ResourceIdentifier) -> Result<Option<Resource>>;

    /// Applies a partial update and returns the updated resource.
    fn patch(&self, patch: &ResourcePatch) -> Result<Resource>;

    /// Removes a resource and every linkage pointing at it.
    fn delete(&self, identifier: &ResourceIdentifier) -> Result<()>;

    /// Lists resources of one type.
    fn list(&self, resource_type: &str, query: &CollectionQuery<'_>) -> Result<Collection>;
}
