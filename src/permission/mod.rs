//! Permission expressions and their evaluation.
//!
//! Permissions are declared as data: each type (and optionally each field)
//! carries an expression per [`Action`]. Expressions combine named checks:
//!
//! ```text
//! read:   "allow all"
//! update: "is owner OR has role admin"
//! delete: "deny all"
//! ```
//!
//! Expressions are compiled against a [`CheckRegistry`] once, at startup.
//! A malformed expression or an unknown check name fails startup, never a
//! request.

mod check;
mod evaluator;
mod expression;

use std::fmt;

pub use check::{AllowAll, Check, CheckRegistry, DenyAll, FnCheck, HasRole, IsOwner, Target};
pub use evaluator::{CompiledExpression, PermissionEvaluator};
pub use expression::{Expression, ExpressionError};

/// An operation a permission expression can govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Reading an entity or field.
    Read,
    /// Creating an entity, or setting a field on create.
    Create,
    /// Changing an entity or field.
    Update,
    /// Deleting an entity.
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// The outcome of evaluating a permission expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The access is permitted.
    Allow,
    /// The access is refused.
    Deny,
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}
