//! PermissionDenied error type for authorization denial.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::permission::Action;

/// Error returned when a permission expression denies an access.
///
/// This is distinct from a malformed request: the request was understood, the
/// evaluator ran, and the answer was deny.
///
/// ```rust
/// use jsonapi_graph::PermissionDenied;
/// use jsonapi_graph::permission::Action;
///
/// let denied = PermissionDenied::new("user:alice", Action::Update, "property/1.myStuff")
///     .with_expression("is owner");
/// assert_eq!(denied.principal(), "user:alice");
/// assert_eq!(denied.action(), Action::Update);
/// assert_eq!(denied.target(), "property/1.myStuff");
/// assert_eq!(denied.expression(), Some("is owner"));
/// ```
#[derive(Debug, Clone)]
pub struct PermissionDenied {
    principal: Cow<'static, str>,
    action: Action,
    /// `type/id` or `type/id.field`; `type` alone for creates.
    target: Cow<'static, str>,
    expression: Option<Cow<'static, str>>,
}

impl PermissionDenied {
    /// Creates a new PermissionDenied error.
    pub fn new(
        principal: impl Into<Cow<'static, str>>,
        action: Action,
        target: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self { principal: principal.into(), action, target: target.into(), expression: None }
    }

    /// Returns the principal that was denied.
    #[inline]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the action that was attempted.
    #[inline]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the entity or field that was addressed.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the expression that denied, if known.
    #[inline]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Sets the denying expression.
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<Cow<'static, str>>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot {} {}", self.principal, self.action, self.target)?;

        if let Some(ref expression) = self.expression {
            write!(f, " (denied by '{}')", expression)?;
        }

        Ok(())
    }
}

impl StdError for PermissionDenied {}

impl From<PermissionDenied> for super::Error {
    fn from(denied: PermissionDenied) -> Self {
        super::Error::forbidden(denied.to_string())
    }
}
