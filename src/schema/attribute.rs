//! Attribute declarations.

use std::fmt;

use serde_json::Value;

/// The JSON type an attribute accepts.
///
/// `null` is accepted by every kind; it clears the attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeKind {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// Any JSON value, including arrays and objects.
    #[default]
    Any,
}

impl AttributeKind {
    /// Returns `true` if `value` is acceptable for this kind.
    ///
    /// ```rust
    /// use jsonapi_graph::schema::AttributeKind;
    /// use serde_json::json;
    ///
    /// assert!(AttributeKind::Integer.accepts(&json!(102)));
    /// assert!(!AttributeKind::Integer.accepts(&json!(10.5)));
    /// assert!(!AttributeKind::Integer.accepts(&json!("102")));
    /// assert!(AttributeKind::String.accepts(&json!(null)));
    /// ```
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            AttributeKind::String => value.is_string(),
            AttributeKind::Integer => value.is_i64() || value.is_u64(),
            AttributeKind::Number => value.is_number(),
            AttributeKind::Boolean => value.is_boolean(),
            AttributeKind::Any => true,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::String => write!(f, "string"),
            AttributeKind::Integer => write!(f, "integer"),
            AttributeKind::Number => write!(f, "number"),
            AttributeKind::Boolean => write!(f, "boolean"),
            AttributeKind::Any => write!(f, "any"),
        }
    }
}
