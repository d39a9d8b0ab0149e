//! Inbound requests.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::types::Principal;

/// HTTP methods the engine dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the method name in upper case.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::method_not_allowed(format!("method '{}' is not supported", other))),
        }
    }
}

/// A request as the transport hands it over.
///
/// The target may carry a query string; the constructors split it off.
///
/// ```rust
/// use jsonapi_graph::{Method, Request};
/// use jsonapi_graph::types::Principal;
///
/// let request = Request::get("/property/1?include=myStuff")
///     .with_principal(Principal::user("alice"));
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.path(), "/property/1");
/// assert_eq!(request.query(), "include=myStuff");
/// assert_eq!(request.principal().id(), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: String,
    body: Option<String>,
    principal: Principal,
}

impl Request {
    /// Creates a request for `target`, a path with an optional `?query`.
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            body: None,
            principal: Principal::anonymous(),
        }
    }

    /// A `GET` request.
    pub fn get(target: impl AsRef<str>) -> Self {
        Self::new(Method::Get, target)
    }

    /// A `POST` request carrying `body`.
    pub fn post(target: impl AsRef<str>, body: impl Into<String>) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    /// A `PATCH` request carrying `body`.
    pub fn patch(target: impl AsRef<str>, body: impl Into<String>) -> Self {
        Self::new(Method::Patch, target).with_body(body)
    }

    /// A `DELETE` request.
    pub fn delete(target: impl AsRef<str>) -> Self {
        Self::new(Method::Delete, target)
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the calling principal. Requests are anonymous by default.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    /// Returns the method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the path without the query string.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string, without the leading `?`.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the body, if any.
    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the calling principal.
    #[inline]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
