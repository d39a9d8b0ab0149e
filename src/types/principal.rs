//! The caller on whose behalf an operation runs.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The authenticated (or anonymous) caller of an operation.
///
/// Permission checks see the principal's id, roles, and free-form
/// attributes. The transport layer builds it; the engine never mutates it.
///
/// ```rust
/// use jsonapi_graph::Principal;
///
/// let alice = Principal::user("alice").with_role("admin").with_attribute("tenant", "acme");
/// assert_eq!(alice.id(), Some("alice"));
/// assert!(alice.has_role("admin"));
/// assert_eq!(alice.attribute("tenant").and_then(|v| v.as_str()), Some("acme"));
///
/// assert!(Principal::anonymous().is_anonymous());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    roles: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    attributes: HashMap<String, Value>,
}

impl Principal {
    /// The anonymous principal: no id, no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A principal identified by `id`.
    pub fn user(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the principal id, if authenticated.
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns `true` if the principal carries no id.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// Returns `true` if the principal holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns all roles.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    /// Returns an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "user:{}", id),
            None => write!(f, "anonymous"),
        }
    }
}
