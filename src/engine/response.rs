//! Outbound responses.

use serde_json::Value;

use crate::Error;
use crate::document::error_document;

/// A status code and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    body: Option<Value>,
}

impl Response {
    /// `200 OK` with `body`.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body: Some(body) }
    }

    /// `201 Created` with `body`.
    pub fn created(body: Value) -> Self {
        Self { status: 201, body: Some(body) }
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Self { status: 204, body: None }
    }

    /// An error document with the status of `error`.
    pub fn from_error(error: &Error) -> Self {
        Self { status: error.status(), body: Some(error_document(error)) }
    }

    /// Returns the status code.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the body, if any.
    #[inline]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Consumes the response, returning the body or `null`.
    pub fn into_body(self) -> Value {
        self.body.unwrap_or(Value::Null)
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<Error> for Response {
    fn from(error: Error) -> Self {
        Self::from_error(&error)
    }
}
