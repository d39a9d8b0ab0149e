//! Named checks referenced by permission expressions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{Principal, Resource};

/// What a permission check is asked about.
///
/// `resource` is the entity being accessed. For creates it is the candidate
/// built from the request payload, with an empty id. `field` is set for
/// attribute or relationship level checks.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    resource_type: &'a str,
    resource: Option<&'a Resource>,
    field: Option<&'a str>,
}

impl<'a> Target<'a> {
    /// An entity-level target.
    pub fn entity(resource: &'a Resource) -> Self {
        Self { resource_type: resource.resource_type(), resource: Some(resource), field: None }
    }

    /// A field-level target.
    pub fn field(resource: &'a Resource, field: &'a str) -> Self {
        Self { resource_type: resource.resource_type(), resource: Some(resource), field: Some(field) }
    }

    /// A type-level target with no entity in hand.
    pub fn of_type(resource_type: &'a str) -> Self {
        Self { resource_type, resource: None, field: None }
    }

    /// A field of a type, with no entity in hand. Used for filter and sort
    /// fields, which are checked before any row is read.
    pub fn type_field(resource_type: &'a str, field: &'a str) -> Self {
        Self { resource_type, resource: None, field: Some(field) }
    }

    /// Returns the type being accessed.
    #[inline]
    pub fn resource_type(&self) -> &'a str {
        self.resource_type
    }

    /// Returns the entity being accessed, if any.
    #[inline]
    pub fn resource(&self) -> Option<&'a Resource> {
        self.resource
    }

    /// Returns the field being accessed, if this is a field-level target.
    #[inline]
    pub fn field_name(&self) -> Option<&'a str> {
        self.field
    }

    /// `type/id` or `type/id.field`, for diagnostics.
    pub fn describe(&self) -> String {
        let mut out = match self.resource {
            Some(resource) if !resource.id().is_empty() => resource.identifier().to_string(),
            _ => self.resource_type.to_string(),
        };
        if let Some(field) = self.field {
            out.push('.');
            out.push_str(field);
        }
        out
    }
}

/// A user-defined permission check.
///
/// Checks must be pure: the same `(principal, target)` always yields the same
/// answer and evaluation has no side effects.
///
/// Closures register through [`CheckRegistry::with_check_fn`]:
///
/// ```rust
/// use jsonapi_graph::permission::CheckRegistry;
///
/// let registry = CheckRegistry::new()
///     .with_check_fn("is authenticated", |principal, _| !principal.is_anonymous());
/// assert!(registry.get("is authenticated").is_some());
/// ```
pub trait Check: Send + Sync {
    /// Returns `true` to allow.
    fn evaluate(&self, principal: &Principal, target: &Target<'_>) -> bool;
}

/// Adapts a closure into a [`Check`].
pub struct FnCheck<F>(F);

impl<F> Check for FnCheck<F>
where
    F: Fn(&Principal, &Target<'_>) -> bool + Send + Sync,
{
    fn evaluate(&self, principal: &Principal, target: &Target<'_>) -> bool {
        (self.0)(principal, target)
    }
}

/// Allows every access.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Check for AllowAll {
    fn evaluate(&self, _: &Principal, _: &Target<'_>) -> bool {
        true
    }
}

/// Denies every access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Check for DenyAll {
    fn evaluate(&self, _: &Principal, _: &Target<'_>) -> bool {
        false
    }
}

/// Allows principals holding a role.
#[derive(Debug, Clone)]
pub struct HasRole(pub String);

impl Check for HasRole {
    fn evaluate(&self, principal: &Principal, _: &Target<'_>) -> bool {
        principal.has_role(&self.0)
    }
}

/// Allows when the entity's `attribute` equals the principal id.
///
/// Denies on type-level targets and for anonymous principals.
#[derive(Debug, Clone)]
pub struct IsOwner {
    attribute: String,
}

impl IsOwner {
    /// Ownership is read from `attribute`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into() }
    }
}

impl Check for IsOwner {
    fn evaluate(&self, principal: &Principal, target: &Target<'_>) -> bool {
        let (Some(id), Some(resource)) = (principal.id(), target.resource()) else {
            return false;
        };
        resource.attribute(&self.attribute).and_then(|v| v.as_str()) == Some(id)
    }
}

/// Check names usable in permission expressions.
///
/// Starts with the built-ins `allow all`, `deny all`, `Prefab.Role.All`, and
/// `Prefab.Role.None`. Lookup is case-insensitive.
#[derive(Clone)]
pub struct CheckRegistry {
    checks: HashMap<String, Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Creates a registry holding only the built-in checks.
    pub fn new() -> Self {
        let mut registry = Self { checks: HashMap::new() };
        registry.insert("allow all", AllowAll);
        registry.insert("deny all", DenyAll);
        registry.insert("Prefab.Role.All", AllowAll);
        registry.insert("Prefab.Role.None", DenyAll);
        registry
    }

    /// Registers a check under `name` (builder style).
    #[must_use]
    pub fn with_check(mut self, name: impl AsRef<str>, check: impl Check + 'static) -> Self {
        self.insert(name, check);
        self
    }

    /// Registers a closure check under `name` (builder style).
    #[must_use]
    pub fn with_check_fn<F>(self, name: impl AsRef<str>, check: F) -> Self
    where
        F: Fn(&Principal, &Target<'_>) -> bool + Send + Sync + 'static,
    {
        self.with_check(name, FnCheck(check))
    }

    /// Registers a check under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl AsRef<str>, check: impl Check + 'static) {
        self.checks.insert(normalize(name.as_ref()), Arc::new(check));
    }

    /// Looks up a check.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Check>> {
        self.checks.get(&normalize(name)).cloned()
    }

    /// Returns the number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.checks.keys().collect();
        names.sort();
        f.debug_struct("CheckRegistry").field("checks", &names).finish()
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}
